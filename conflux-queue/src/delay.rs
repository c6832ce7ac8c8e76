use core::cmp::Ordering as CmpOrdering;
use core::fmt;
use std::collections::BinaryHeap;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// An element together with the instant it becomes visible.
struct Delayed<T> {
    value: T,
    deadline: Instant,
    /// Insertion number; breaks deadline ties in FIFO order and gives the
    /// heap a total order without constraining `T`.
    seq: u64,
}

impl<T> PartialEq for Delayed<T> {
    fn eq(&self, other: &Delayed<T>) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl<T> Eq for Delayed<T> {}

impl<T> PartialOrd for Delayed<T> {
    fn partial_cmp(&self, other: &Delayed<T>) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Delayed<T> {
    fn cmp(&self, other: &Delayed<T>) -> CmpOrdering {
        // Reversed: the earliest deadline must sit on top of the max-heap.
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct State<T> {
    heap: BinaryHeap<Delayed<T>>,
    seq: u64,
}

/// A queue whose elements become visible only after a per-element delay.
///
/// Every push carries a delay; the element's deadline is the push instant
/// plus that delay on the monotonic clock. Consumers only ever receive
/// expired elements, earliest deadline first; [`pop`](DelayQueue::pop)
/// sleeps until the earliest deadline and re-arms itself whenever a new
/// element with a sooner deadline arrives.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use conflux_queue::DelayQueue;
///
/// let q = DelayQueue::new();
///
/// q.push("later", Duration::from_millis(50));
/// q.push("sooner", Duration::from_millis(10));
///
/// assert_eq!(q.try_pop(), None);
/// assert_eq!(q.pop(), "sooner");
/// assert_eq!(q.pop(), "later");
/// ```
pub struct DelayQueue<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
}

impl<T> DelayQueue<T> {
    /// Creates a new empty queue.
    pub fn new() -> DelayQueue<T> {
        DelayQueue {
            state: Mutex::new(State {
                heap: BinaryHeap::new(),
                seq: 0,
            }),
            not_empty: Condvar::new(),
        }
    }

    /// Inserts an element that becomes visible `delay` from now.
    pub fn push(&self, value: T, delay: Duration) {
        let deadline = Instant::now() + delay;
        let mut state = self.state.lock().unwrap();
        let seq = state.seq;
        state.seq += 1;
        state.heap.push(Delayed {
            value,
            deadline,
            seq,
        });
        drop(state);
        // A sleeping consumer may be waiting on a later deadline; wake it
        // so it can re-arm on the new earliest one.
        self.not_empty.notify_one();
    }

    /// Removes the earliest element, blocking until one has expired.
    pub fn pop(&self) -> T {
        let mut state = self.state.lock().unwrap();
        loop {
            let now = Instant::now();
            match state.heap.peek().map(|top| top.deadline) {
                None => state = self.not_empty.wait(state).unwrap(),
                Some(deadline) if deadline <= now => {
                    if let Some(delayed) = state.heap.pop() {
                        return delayed.value;
                    }
                }
                Some(deadline) => {
                    let (guard, _) = self
                        .not_empty
                        .wait_timeout(state, deadline.saturating_duration_since(now))
                        .unwrap();
                    state = guard;
                }
            }
        }
    }

    /// Removes the earliest element if it has expired, or returns `None`.
    pub fn try_pop(&self) -> Option<T> {
        let mut state = self.state.lock().unwrap();
        let expired = matches!(
            state.heap.peek(),
            Some(top) if top.deadline <= Instant::now()
        );
        if expired {
            state.heap.pop().map(|delayed| delayed.value)
        } else {
            None
        }
    }

    /// Returns the time until the earliest element expires, or `None` if
    /// the queue is empty. An already-expired element yields zero.
    pub fn next_delay(&self) -> Option<Duration> {
        let state = self.state.lock().unwrap();
        state
            .heap
            .peek()
            .map(|top| top.deadline.saturating_duration_since(Instant::now()))
    }

    /// Removes all elements, expired or not.
    pub fn clear(&self) {
        self.state.lock().unwrap().heap.clear();
    }

    /// Returns the number of elements in the queue, expired or not.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().heap.len()
    }

    /// Returns `true` if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.state.lock().unwrap().heap.is_empty()
    }
}

impl<T> Default for DelayQueue<T> {
    fn default() -> DelayQueue<T> {
        DelayQueue::new()
    }
}

impl<T> fmt::Debug for DelayQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("DelayQueue { .. }")
    }
}
