use core::convert::Infallible;
use core::fmt;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use crate::{BlockingQueue, Queue};

/// An unbounded FIFO queue guarded by a single mutex.
///
/// This is the simplest correct queue: one lock protects the whole
/// backing buffer and a condition variable parks consumers while the
/// queue is empty. All operations serialize on that lock, so it scales
/// poorly under contention, but its `len` is exact and its ordering is
/// strict FIFO over the lock's serialization order.
///
/// # Examples
///
/// ```
/// use conflux_queue::MutexQueue;
///
/// let q = MutexQueue::new();
///
/// q.push(1);
/// q.push(2);
///
/// assert_eq!(q.try_pop(), Some(1));
/// assert_eq!(q.wait_and_pop(), 2);
/// assert!(q.is_empty());
/// ```
pub struct MutexQueue<T> {
    items: Mutex<VecDeque<T>>,
    not_empty: Condvar,
}

impl<T> MutexQueue<T> {
    /// Creates a new empty queue.
    pub fn new() -> MutexQueue<T> {
        MutexQueue {
            items: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
        }
    }

    /// Inserts an element at the back of the queue.
    pub fn push(&self, value: T) {
        let mut items = self.items.lock().unwrap();
        items.push_back(value);
        drop(items);
        self.not_empty.notify_one();
    }

    /// Removes the front element, or returns `None` if the queue is empty.
    pub fn try_pop(&self) -> Option<T> {
        self.items.lock().unwrap().pop_front()
    }

    /// Removes the front element, blocking while the queue is empty.
    pub fn wait_and_pop(&self) -> T {
        let mut items = self.items.lock().unwrap();
        loop {
            match items.pop_front() {
                Some(value) => return value,
                None => items = self.not_empty.wait(items).unwrap(),
            }
        }
    }

    /// Returns the number of elements in the queue.
    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    /// Returns `true` if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }
}

impl<T: Send> Queue<T> for MutexQueue<T> {
    type PushError = Infallible;

    fn push(&self, value: T) -> Result<(), Infallible> {
        MutexQueue::push(self, value);
        Ok(())
    }

    fn try_pop(&self) -> Option<T> {
        MutexQueue::try_pop(self)
    }

    fn len(&self) -> usize {
        MutexQueue::len(self)
    }

    fn is_empty(&self) -> bool {
        MutexQueue::is_empty(self)
    }
}

impl<T: Send> BlockingQueue<T> for MutexQueue<T> {
    fn wait_and_pop(&self) -> T {
        MutexQueue::wait_and_pop(self)
    }
}

impl<T> Default for MutexQueue<T> {
    fn default() -> MutexQueue<T> {
        MutexQueue::new()
    }
}

impl<T> fmt::Debug for MutexQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("MutexQueue { .. }")
    }
}
