use core::cell::UnsafeCell;
use core::fmt;
use core::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::{Backoff, CachePadded};

use crate::{PushError, Queue};

/// A slot in the ring.
struct Slot<T> {
    /// The sequence stamp. A producer may claim the slot for position `p`
    /// when the stamp equals `p`; it commits by storing `p + 1`, which is
    /// what a consumer at position `p` waits for. The consumer releases
    /// the slot for the next lap by storing `p + capacity`.
    seq: AtomicUsize,

    value: UnsafeCell<MaybeUninit<T>>,
}

/// A bounded lock-free MPMC queue backed by a fixed-capacity ring.
///
/// Head and tail are monotonically increasing position counters; a
/// position maps to the slot at `position % capacity`. Each slot carries a
/// sequence stamp, so claiming a position (the index CAS) and publishing
/// its value (the stamp store) are separate steps: a consumer never reads
/// a slot before the producer has committed it, and the full capacity is
/// usable.
///
/// `push` fails rather than blocks when the queue is full.
///
/// # Examples
///
/// ```
/// use conflux_queue::RingQueue;
///
/// let q = RingQueue::new(2);
///
/// assert!(q.push('a').is_ok());
/// assert!(q.push('b').is_ok());
/// assert!(q.push('c').is_err());
/// assert_eq!(q.try_pop(), Some('a'));
/// ```
pub struct RingQueue<T> {
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
    buffer: Box<[Slot<T>]>,
    cap: usize,
}

unsafe impl<T: Send> Send for RingQueue<T> {}
unsafe impl<T: Send> Sync for RingQueue<T> {}

impl<T> RingQueue<T> {
    /// Creates a new empty queue with room for `cap` elements.
    ///
    /// # Panics
    ///
    /// Panics if `cap` is less than two.
    pub fn new(cap: usize) -> RingQueue<T> {
        assert!(cap >= 2, "capacity must be at least 2");

        let buffer = (0..cap)
            .map(|i| Slot {
                seq: AtomicUsize::new(i),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();

        RingQueue {
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            buffer,
            cap,
        }
    }

    /// Attempts to insert an element at the back of the queue.
    ///
    /// If the queue is full, the element is handed back inside the error.
    pub fn push(&self, value: T) -> Result<(), PushError<T>> {
        let backoff = Backoff::new();
        let mut tail = self.tail.load(Ordering::Relaxed);

        loop {
            let slot = &self.buffer[tail % self.cap];
            let seq = slot.seq.load(Ordering::Acquire);
            let dif = (seq as isize).wrapping_sub(tail as isize);

            if dif == 0 {
                // The slot is free for this lap; try to claim the position.
                match self.tail.compare_exchange_weak(
                    tail,
                    tail.wrapping_add(1),
                    Ordering::SeqCst,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // Commit: write the value, then publish the stamp
                        // consumers are waiting for.
                        unsafe { slot.value.get().write(MaybeUninit::new(value)) };
                        slot.seq.store(tail.wrapping_add(1), Ordering::Release);
                        return Ok(());
                    }
                    Err(t) => {
                        tail = t;
                        backoff.spin();
                    }
                }
            } else if dif < 0 {
                // The slot still holds last lap's value. If the tail has
                // not moved, the queue is genuinely full.
                let current = self.tail.load(Ordering::Relaxed);
                if current == tail {
                    return Err(PushError(value));
                }
                tail = current;
                backoff.spin();
            } else {
                // Stale tail; reload.
                tail = self.tail.load(Ordering::Relaxed);
                backoff.spin();
            }
        }
    }

    /// Removes the front element, or returns `None` if the queue is
    /// observed empty.
    pub fn try_pop(&self) -> Option<T> {
        let backoff = Backoff::new();
        let mut head = self.head.load(Ordering::Relaxed);

        loop {
            let slot = &self.buffer[head % self.cap];
            let seq = slot.seq.load(Ordering::Acquire);
            let dif = (seq as isize).wrapping_sub(head.wrapping_add(1) as isize);

            if dif == 0 {
                // The slot is committed for this lap; try to claim it.
                match self.head.compare_exchange_weak(
                    head,
                    head.wrapping_add(1),
                    Ordering::SeqCst,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        let value = unsafe { slot.value.get().read().assume_init() };
                        // Free the slot for the producer one lap ahead.
                        slot.seq
                            .store(head.wrapping_add(self.cap), Ordering::Release);
                        return Some(value);
                    }
                    Err(h) => {
                        head = h;
                        backoff.spin();
                    }
                }
            } else if dif < 0 {
                // The producer at this position has not committed. If the
                // head has not moved, the queue is observed empty.
                let current = self.head.load(Ordering::Relaxed);
                if current == head {
                    return None;
                }
                head = current;
                backoff.spin();
            } else {
                head = self.head.load(Ordering::Relaxed);
                backoff.spin();
            }
        }
    }

    /// Returns the capacity of the queue.
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Returns the number of elements in the queue.
    pub fn len(&self) -> usize {
        loop {
            let head = self.head.load(Ordering::SeqCst);
            let tail = self.tail.load(Ordering::SeqCst);

            // Retry until the two reads are consistent with each other.
            if self.head.load(Ordering::SeqCst) == head {
                return tail.wrapping_sub(head).min(self.cap);
            }
        }
    }

    /// Returns `true` if the queue is observed empty.
    pub fn is_empty(&self) -> bool {
        let head = self.head.load(Ordering::SeqCst);
        let tail = self.tail.load(Ordering::SeqCst);
        head == tail
    }

    /// Returns `true` if the queue is observed full.
    pub fn is_full(&self) -> bool {
        self.len() == self.cap
    }
}

impl<T> Drop for RingQueue<T> {
    fn drop(&mut self) {
        let head = *self.head.get_mut();
        let tail = *self.tail.get_mut();

        let mut pos = head;
        while pos != tail {
            let slot = &mut self.buffer[pos % self.cap];
            unsafe { slot.value.get_mut().as_mut_ptr().drop_in_place() };
            pos = pos.wrapping_add(1);
        }
    }
}

impl<T: Send> Queue<T> for RingQueue<T> {
    type PushError = PushError<T>;

    fn push(&self, value: T) -> Result<(), PushError<T>> {
        RingQueue::push(self, value)
    }

    fn try_pop(&self) -> Option<T> {
        RingQueue::try_pop(self)
    }

    fn len(&self) -> usize {
        RingQueue::len(self)
    }

    fn is_empty(&self) -> bool {
        RingQueue::is_empty(self)
    }
}

impl<T> fmt::Debug for RingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("RingQueue { .. }")
    }
}
