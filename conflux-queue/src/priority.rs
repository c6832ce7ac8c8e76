use core::convert::Infallible;
use core::fmt;
use std::collections::BinaryHeap;
use std::sync::{Condvar, Mutex};

use crate::{BlockingQueue, PushError, Queue};

/// A queue that yields its elements in priority order.
///
/// Elements are kept in a binary heap under a single mutex; each pop
/// removes the greatest element by `T`'s ordering. For smallest-first
/// order wrap the elements in [`core::cmp::Reverse`]. Inspecting the top
/// and removing it are one fused operation: exposing them separately
/// would let another consumer pop between the two.
///
/// A queue built with [`bounded`](PriorityQueue::bounded) additionally
/// applies backpressure: `push` blocks while the queue is at capacity and
/// every pop signals waiting producers.
///
/// Ordering between equal elements is unspecified.
///
/// # Examples
///
/// ```
/// use conflux_queue::PriorityQueue;
///
/// let q = PriorityQueue::new();
///
/// q.push(3);
/// q.push(7);
/// q.push(5);
///
/// assert_eq!(q.try_pop(), Some(7));
/// assert_eq!(q.try_pop(), Some(5));
/// assert_eq!(q.try_pop(), Some(3));
/// ```
pub struct PriorityQueue<T> {
    heap: Mutex<BinaryHeap<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    /// Zero means unbounded.
    max_size: usize,
}

impl<T: Ord> PriorityQueue<T> {
    /// Creates a new unbounded queue.
    pub fn new() -> PriorityQueue<T> {
        PriorityQueue {
            heap: Mutex::new(BinaryHeap::new()),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            max_size: 0,
        }
    }

    /// Creates a new bounded queue holding at most `max_size` elements.
    ///
    /// # Panics
    ///
    /// Panics if `max_size` is zero.
    pub fn bounded(max_size: usize) -> PriorityQueue<T> {
        assert!(max_size > 0, "capacity must be greater than zero");
        PriorityQueue {
            heap: Mutex::new(BinaryHeap::with_capacity(max_size)),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            max_size,
        }
    }

    /// Inserts an element, blocking while a bounded queue is at capacity.
    pub fn push(&self, value: T) {
        let mut heap = self.heap.lock().unwrap();
        if self.max_size > 0 {
            while heap.len() >= self.max_size {
                heap = self.not_full.wait(heap).unwrap();
            }
        }
        heap.push(value);
        drop(heap);
        self.not_empty.notify_one();
    }

    /// Attempts to insert an element without blocking.
    ///
    /// Fails only on a bounded queue at capacity; the element is handed
    /// back inside the error.
    pub fn try_push(&self, value: T) -> Result<(), PushError<T>> {
        let mut heap = self.heap.lock().unwrap();
        if self.max_size > 0 && heap.len() >= self.max_size {
            return Err(PushError(value));
        }
        heap.push(value);
        drop(heap);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Removes the greatest element, or returns `None` if the queue is
    /// empty.
    pub fn try_pop(&self) -> Option<T> {
        let mut heap = self.heap.lock().unwrap();
        let value = heap.pop();
        drop(heap);
        if value.is_some() && self.max_size > 0 {
            self.not_full.notify_one();
        }
        value
    }

    /// Removes the greatest element, blocking while the queue is empty.
    pub fn wait_and_pop(&self) -> T {
        let mut heap = self.heap.lock().unwrap();
        loop {
            match heap.pop() {
                Some(value) => {
                    drop(heap);
                    if self.max_size > 0 {
                        self.not_full.notify_one();
                    }
                    return value;
                }
                None => heap = self.not_empty.wait(heap).unwrap(),
            }
        }
    }

    /// Returns the number of elements in the queue.
    pub fn len(&self) -> usize {
        self.heap.lock().unwrap().len()
    }

    /// Returns `true` if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.heap.lock().unwrap().is_empty()
    }

    /// Returns the capacity, or `None` if the queue is unbounded.
    pub fn capacity(&self) -> Option<usize> {
        if self.max_size > 0 {
            Some(self.max_size)
        } else {
            None
        }
    }

    /// Returns how many more elements a bounded queue can accept, or
    /// `None` if the queue is unbounded.
    pub fn remaining_capacity(&self) -> Option<usize> {
        if self.max_size > 0 {
            Some(self.max_size - self.heap.lock().unwrap().len())
        } else {
            None
        }
    }
}

impl<T: Ord + Send> Queue<T> for PriorityQueue<T> {
    type PushError = Infallible;

    fn push(&self, value: T) -> Result<(), Infallible> {
        PriorityQueue::push(self, value);
        Ok(())
    }

    fn try_pop(&self) -> Option<T> {
        PriorityQueue::try_pop(self)
    }

    fn len(&self) -> usize {
        PriorityQueue::len(self)
    }

    fn is_empty(&self) -> bool {
        PriorityQueue::is_empty(self)
    }
}

impl<T: Ord + Send> BlockingQueue<T> for PriorityQueue<T> {
    fn wait_and_pop(&self) -> T {
        PriorityQueue::wait_and_pop(self)
    }
}

impl<T: Ord> Default for PriorityQueue<T> {
    fn default() -> PriorityQueue<T> {
        PriorityQueue::new()
    }
}

impl<T> fmt::Debug for PriorityQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("PriorityQueue { .. }")
    }
}
