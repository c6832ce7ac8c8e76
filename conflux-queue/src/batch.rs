use core::fmt;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// The default upper bound on the size of a popped batch.
pub const DEFAULT_MAX_BATCH: usize = 1024;

/// The default time a blocking batch pop waits for elements.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(100);

/// A queue optimized for bursty producers and batch consumers.
///
/// Elements accumulate in a contiguous buffer; consumers take up to
/// `max_batch` elements at a time, amortizing lock and notification cost
/// over the whole burst. Blocking pops wait at most `max_wait` (or a
/// caller-supplied duration) and then return whatever is available,
/// possibly nothing.
///
/// # Examples
///
/// ```
/// use conflux_queue::BatchQueue;
///
/// let q = BatchQueue::new();
///
/// q.batch_push(vec![1, 2, 3]);
/// q.push(4);
///
/// assert_eq!(q.try_batch_pop(), vec![1, 2, 3, 4]);
/// assert!(q.try_batch_pop().is_empty());
/// ```
pub struct BatchQueue<T> {
    buffer: Mutex<VecDeque<T>>,
    not_empty: Condvar,
    max_batch: usize,
    max_wait: Duration,
}

impl<T> BatchQueue<T> {
    /// Creates a new empty queue with the default batch size and wait.
    pub fn new() -> BatchQueue<T> {
        BatchQueue::with_config(DEFAULT_MAX_BATCH, DEFAULT_MAX_WAIT)
    }

    /// Creates a new empty queue popping at most `max_batch` elements per
    /// batch and waiting at most `max_wait` in [`batch_pop`].
    ///
    /// [`batch_pop`]: BatchQueue::batch_pop
    ///
    /// # Panics
    ///
    /// Panics if `max_batch` is zero.
    pub fn with_config(max_batch: usize, max_wait: Duration) -> BatchQueue<T> {
        assert!(max_batch > 0, "max batch size must be greater than zero");
        BatchQueue {
            buffer: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
            max_batch,
            max_wait,
        }
    }

    /// Inserts a single element at the back of the queue.
    pub fn push(&self, value: T) {
        let mut buffer = self.buffer.lock().unwrap();
        buffer.push_back(value);
        drop(buffer);
        self.not_empty.notify_one();
    }

    /// Moves a whole batch of elements to the back of the queue.
    ///
    /// Pushing an empty batch is a no-op.
    pub fn batch_push(&self, elements: Vec<T>) {
        if elements.is_empty() {
            return;
        }
        let mut buffer = self.buffer.lock().unwrap();
        buffer.extend(elements);
        drop(buffer);
        // One burst can satisfy several batch consumers.
        self.not_empty.notify_all();
    }

    /// Takes up to `max_batch` elements from the front of the queue,
    /// waiting up to `max_wait` for the queue to become non-empty.
    ///
    /// Returns an empty vector if the wait times out.
    pub fn batch_pop(&self) -> Vec<T> {
        self.batch_pop_for(self.max_wait)
    }

    /// Takes up to `max_batch` elements from the front of the queue,
    /// waiting up to `wait` for the queue to become non-empty.
    pub fn batch_pop_for(&self, wait: Duration) -> Vec<T> {
        let buffer = self.buffer.lock().unwrap();
        let (mut buffer, _) = self
            .not_empty
            .wait_timeout_while(buffer, wait, |buffer| buffer.is_empty())
            .unwrap();
        self.extract(&mut buffer)
    }

    /// Takes up to `max_batch` elements without blocking.
    pub fn try_batch_pop(&self) -> Vec<T> {
        let mut buffer = self.buffer.lock().unwrap();
        self.extract(&mut buffer)
    }

    /// Returns the number of elements in the queue.
    pub fn len(&self) -> usize {
        self.buffer.lock().unwrap().len()
    }

    /// Returns `true` if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.lock().unwrap().is_empty()
    }

    /// Removes all elements.
    pub fn clear(&self) {
        self.buffer.lock().unwrap().clear();
    }

    fn extract(&self, buffer: &mut VecDeque<T>) -> Vec<T> {
        let take = buffer.len().min(self.max_batch);
        buffer.drain(..take).collect()
    }
}

impl<T> Default for BatchQueue<T> {
    fn default() -> BatchQueue<T> {
        BatchQueue::new()
    }
}

impl<T> fmt::Debug for BatchQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("BatchQueue { .. }")
    }
}
