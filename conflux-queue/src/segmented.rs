use core::convert::Infallible;
use core::fmt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use crossbeam_utils::CachePadded;

use crate::{BlockingQueue, Queue};

/// The default number of elements per segment.
pub const DEFAULT_SEGMENT_SIZE: usize = 1024;

struct Segment<T> {
    items: Mutex<VecDeque<T>>,
}

/// An unbounded FIFO queue built from fixed-size segments with one lock
/// per segment.
///
/// Producers operate on the segment designated by an atomic tail index
/// and consumers on the one designated by an atomic head index, so once
/// the two indices diverge the two sides of the queue contend on
/// different locks. A segment index only ever moves forward: producers
/// advance the tail when their segment fills up, consumers advance the
/// head when their segment drains and the tail has moved on.
///
/// Ordering is FIFO within a segment and at the granularity of segment
/// transitions across segments. `len` is approximate: it sums the
/// per-segment sizes without a global snapshot.
///
/// # Examples
///
/// ```
/// use conflux_queue::SegmentedQueue;
///
/// let q = SegmentedQueue::new();
///
/// q.push(1);
/// q.push(2);
///
/// assert_eq!(q.try_pop(), Some(1));
/// assert_eq!(q.try_pop(), Some(2));
/// assert_eq!(q.try_pop(), None);
/// ```
pub struct SegmentedQueue<T> {
    /// Lazily grown directory of segments, indexed by segment number.
    directory: Mutex<Vec<Arc<Segment<T>>>>,

    /// Index of the segment consumers currently pop from.
    head_seg: CachePadded<AtomicUsize>,

    /// Index of the segment producers currently push into.
    tail_seg: CachePadded<AtomicUsize>,

    seg_size: usize,

    /// Parks consumers in `wait_and_pop`; the queue state lives under the
    /// per-segment locks, so a dedicated mutex pairs with the condvar.
    sleep: Mutex<()>,
    not_empty: Condvar,
    waiters: AtomicUsize,
}

impl<T> SegmentedQueue<T> {
    /// Creates a new empty queue with [`DEFAULT_SEGMENT_SIZE`] elements
    /// per segment.
    pub fn new() -> SegmentedQueue<T> {
        SegmentedQueue::with_segment_size(DEFAULT_SEGMENT_SIZE)
    }

    /// Creates a new empty queue with `seg_size` elements per segment.
    ///
    /// # Panics
    ///
    /// Panics if `seg_size` is zero.
    pub fn with_segment_size(seg_size: usize) -> SegmentedQueue<T> {
        assert!(seg_size > 0, "segment size must be greater than zero");
        SegmentedQueue {
            directory: Mutex::new(Vec::new()),
            head_seg: CachePadded::new(AtomicUsize::new(0)),
            tail_seg: CachePadded::new(AtomicUsize::new(0)),
            seg_size,
            sleep: Mutex::new(()),
            not_empty: Condvar::new(),
            waiters: AtomicUsize::new(0),
        }
    }

    /// Returns the segment at `idx`, creating it (and any gap before it)
    /// on first access.
    fn segment(&self, idx: usize) -> Arc<Segment<T>> {
        let mut directory = self.directory.lock().unwrap();
        while directory.len() <= idx {
            directory.push(Arc::new(Segment {
                items: Mutex::new(VecDeque::new()),
            }));
        }
        directory[idx].clone()
    }

    /// Inserts an element at the back of the queue.
    pub fn push(&self, value: T) {
        loop {
            let tail = self.tail_seg.load(Ordering::Acquire);
            let seg = self.segment(tail);
            let mut items = seg.items.lock().unwrap();

            // The tail index may have moved while the lock was being
            // acquired. Pushing into a retired segment would strand the
            // element behind an already-advanced head index.
            if self.tail_seg.load(Ordering::Acquire) != tail {
                continue;
            }

            if items.len() < self.seg_size {
                items.push_back(value);
                drop(items);
                self.signal();
                return;
            }

            // Segment full: move the tail on and retry there.
            drop(items);
            let _ = self.tail_seg.compare_exchange(
                tail,
                tail + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
        }
    }

    /// Removes the front element, or returns `None` if the queue is
    /// observed empty.
    pub fn try_pop(&self) -> Option<T> {
        loop {
            let head = self.head_seg.load(Ordering::Acquire);
            let seg = self.segment(head);
            let mut items = seg.items.lock().unwrap();

            if self.head_seg.load(Ordering::Acquire) != head {
                // Another consumer retired this segment under us.
                continue;
            }

            if let Some(value) = items.pop_front() {
                // Retire the segment once drained, but never past the
                // producers' segment.
                if items.is_empty() && head != self.tail_seg.load(Ordering::Acquire) {
                    let _ = self.head_seg.compare_exchange(
                        head,
                        head + 1,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    );
                }
                return Some(value);
            }

            drop(items);
            if head == self.tail_seg.load(Ordering::Acquire) {
                return None;
            }
            let _ = self.head_seg.compare_exchange(
                head,
                head + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
        }
    }

    /// Removes the front element, blocking while the queue is empty.
    pub fn wait_and_pop(&self) -> T {
        loop {
            if let Some(value) = self.try_pop() {
                return value;
            }

            let sleep = self.sleep.lock().unwrap();
            self.waiters.fetch_add(1, Ordering::SeqCst);
            // Probe once more after registering: a producer that saw no
            // waiter must have completed its push before the registration,
            // and this probe will find the element.
            if let Some(value) = self.try_pop() {
                self.waiters.fetch_sub(1, Ordering::SeqCst);
                return value;
            }
            let sleep = self.not_empty.wait(sleep).unwrap();
            self.waiters.fetch_sub(1, Ordering::SeqCst);
            drop(sleep);
        }
    }

    /// Sums the sizes of all live segments.
    ///
    /// Each segment is read under its own lock, but there is no global
    /// snapshot: the result is an estimate, not a linearization point.
    pub fn approximate_size(&self) -> usize {
        let head = self.head_seg.load(Ordering::Acquire);
        let tail = self.tail_seg.load(Ordering::Acquire);
        let mut total = 0;
        for idx in head..=tail {
            let seg = self.segment(idx);
            total += seg.items.lock().unwrap().len();
        }
        total
    }

    /// Returns `true` if the queue is observed empty.
    pub fn is_empty(&self) -> bool {
        self.approximate_size() == 0
    }

    fn signal(&self) {
        if self.waiters.load(Ordering::SeqCst) != 0 {
            // See `LinkedQueue::push` for the role of this lock round-trip.
            drop(self.sleep.lock().unwrap());
            self.not_empty.notify_one();
        }
    }
}

impl<T: Send> Queue<T> for SegmentedQueue<T> {
    type PushError = Infallible;

    fn push(&self, value: T) -> Result<(), Infallible> {
        SegmentedQueue::push(self, value);
        Ok(())
    }

    fn try_pop(&self) -> Option<T> {
        SegmentedQueue::try_pop(self)
    }

    fn len(&self) -> usize {
        self.approximate_size()
    }

    fn is_empty(&self) -> bool {
        SegmentedQueue::is_empty(self)
    }
}

impl<T: Send> BlockingQueue<T> for SegmentedQueue<T> {
    fn wait_and_pop(&self) -> T {
        SegmentedQueue::wait_and_pop(self)
    }
}

impl<T> Default for SegmentedQueue<T> {
    fn default() -> SegmentedQueue<T> {
        SegmentedQueue::new()
    }
}

impl<T> fmt::Debug for SegmentedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("SegmentedQueue { .. }")
    }
}
