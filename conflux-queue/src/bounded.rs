use core::convert::Infallible;
use core::fmt;
use core::marker::PhantomData;
use std::sync::{Condvar, Mutex};

use crate::{BlockingQueue, MutexQueue, PushError, Queue};

/// A capacity wrapper that adds backpressure to any unbounded queue.
///
/// The wrapper keeps an authoritative element counter under its own mutex
/// and parks producers on `not_full` and consumers on `not_empty`. Every
/// operation on the underlying queue happens while that mutex is held, so
/// the counter always equals the underlying queue's size and `len` is
/// exact and O(1).
///
/// [`BoundedQueue`] is the common instantiation over [`MutexQueue`].
///
/// # Examples
///
/// ```
/// use conflux_queue::BoundedQueue;
///
/// let q = BoundedQueue::with_capacity(2);
///
/// q.push('a');
/// q.push('b');
/// assert!(q.try_push('c').is_err());
///
/// assert_eq!(q.wait_and_pop(), 'a');
/// assert!(q.try_push('c').is_ok());
/// ```
pub struct Bounded<T, Q = MutexQueue<T>> {
    inner: Q,
    max_size: usize,
    size: Mutex<usize>,
    not_empty: Condvar,
    not_full: Condvar,
    _marker: PhantomData<fn(T) -> T>,
}

/// A bounded FIFO queue over a mutex-guarded backing buffer.
pub type BoundedQueue<T> = Bounded<T, MutexQueue<T>>;

impl<T: Send> Bounded<T, MutexQueue<T>> {
    /// Creates a bounded FIFO queue with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if the capacity is zero.
    pub fn with_capacity(max_size: usize) -> BoundedQueue<T> {
        Bounded::new(MutexQueue::new(), max_size)
    }
}

impl<T, Q> Bounded<T, Q>
where
    T: Send,
    Q: Queue<T, PushError = Infallible>,
{
    /// Wraps `inner` with a capacity of `max_size` elements.
    ///
    /// `inner` must be empty; the wrapper's counter starts at zero.
    ///
    /// # Panics
    ///
    /// Panics if the capacity is zero.
    pub fn new(inner: Q, max_size: usize) -> Bounded<T, Q> {
        assert!(max_size > 0, "capacity must be greater than zero");
        Bounded {
            inner,
            max_size,
            size: Mutex::new(0),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            _marker: PhantomData,
        }
    }

    /// Inserts an element, blocking while the queue is full.
    pub fn push(&self, value: T) {
        let mut size = self.size.lock().unwrap();
        while *size == self.max_size {
            size = self.not_full.wait(size).unwrap();
        }
        let _ = self.inner.push(value);
        *size += 1;
        drop(size);
        self.not_empty.notify_one();
    }

    /// Attempts to insert an element without blocking.
    ///
    /// If the queue is full, the element is handed back inside the error.
    pub fn try_push(&self, value: T) -> Result<(), PushError<T>> {
        let mut size = self.size.lock().unwrap();
        if *size == self.max_size {
            return Err(PushError(value));
        }
        let _ = self.inner.push(value);
        *size += 1;
        drop(size);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Removes the front element, or returns `None` if the queue is empty.
    pub fn try_pop(&self) -> Option<T> {
        let mut size = self.size.lock().unwrap();
        if *size == 0 {
            return None;
        }
        let value = self.inner.try_pop();
        if value.is_some() {
            *size -= 1;
            drop(size);
            self.not_full.notify_one();
        }
        value
    }

    /// Removes the front element, blocking while the queue is empty.
    pub fn wait_and_pop(&self) -> T {
        let mut size = self.size.lock().unwrap();
        while *size == 0 {
            size = self.not_empty.wait(size).unwrap();
        }
        // The counter is authoritative: a positive count means the
        // underlying queue holds an element.
        let value = self.inner.try_pop().expect("counter out of sync");
        *size -= 1;
        drop(size);
        self.not_full.notify_one();
        value
    }

    /// Returns the capacity of the queue.
    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// Returns the number of elements in the queue.
    pub fn len(&self) -> usize {
        *self.size.lock().unwrap()
    }

    /// Returns `true` if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the queue is at capacity.
    pub fn is_full(&self) -> bool {
        self.len() == self.max_size
    }
}

impl<T, Q> Queue<T> for Bounded<T, Q>
where
    T: Send,
    Q: Queue<T, PushError = Infallible>,
{
    type PushError = Infallible;

    fn push(&self, value: T) -> Result<(), Infallible> {
        Bounded::push(self, value);
        Ok(())
    }

    fn try_pop(&self) -> Option<T> {
        Bounded::try_pop(self)
    }

    fn len(&self) -> usize {
        Bounded::len(self)
    }

    fn is_empty(&self) -> bool {
        Bounded::is_empty(self)
    }
}

impl<T, Q> BlockingQueue<T> for Bounded<T, Q>
where
    T: Send,
    Q: Queue<T, PushError = Infallible>,
{
    fn wait_and_pop(&self) -> T {
        Bounded::wait_and_pop(self)
    }
}

impl<T, Q> fmt::Debug for Bounded<T, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("Bounded { .. }")
    }
}
