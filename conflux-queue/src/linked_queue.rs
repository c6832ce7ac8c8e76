use core::convert::Infallible;
use core::fmt;
use core::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

use crate::{BlockingQueue, Queue};

/// A node in the linked chain.
///
/// The node currently designated as the sentinel has had its value taken;
/// every node behind it still carries one.
struct Node<T> {
    value: Option<T>,
    next: AtomicPtr<Node<T>>,
}

impl<T> Node<T> {
    fn new(value: Option<T>) -> *mut Node<T> {
        Box::into_raw(Box::new(Node {
            value,
            next: AtomicPtr::new(ptr::null_mut()),
        }))
    }
}

/// An unbounded FIFO queue with disjoint head and tail locks.
///
/// Producers serialize on the tail lock and consumers on the head lock, so
/// the two sides of the queue scale independently. A permanently present
/// sentinel node keeps the two locks apart: a pop retires the current
/// sentinel and promotes the next node, whose value has just been taken,
/// into its place. The `next` links are atomic because a consumer probing
/// an empty queue reads the sentinel's link concurrently with a producer
/// publishing through it.
///
/// `len` is maintained on a separate counter and may briefly lag the
/// queue's true size while operations are in flight.
///
/// # Examples
///
/// ```
/// use conflux_queue::LinkedQueue;
///
/// let q = LinkedQueue::new();
///
/// q.push('a');
/// q.push('b');
///
/// assert_eq!(q.try_pop(), Some('a'));
/// assert_eq!(q.try_pop(), Some('b'));
/// assert_eq!(q.try_pop(), None);
/// ```
pub struct LinkedQueue<T> {
    /// The sentinel node. Consumers only.
    head: Mutex<*mut Node<T>>,

    /// The last node in the chain. Producers only.
    tail: Mutex<*mut Node<T>>,

    /// Parks consumers; paired with the head mutex.
    not_empty: Condvar,

    /// Number of consumers blocked in `wait_and_pop`.
    waiters: AtomicUsize,

    len: AtomicUsize,
}

unsafe impl<T: Send> Send for LinkedQueue<T> {}
unsafe impl<T: Send> Sync for LinkedQueue<T> {}

impl<T> LinkedQueue<T> {
    /// Creates a new empty queue.
    pub fn new() -> LinkedQueue<T> {
        let sentinel = Node::new(None);
        LinkedQueue {
            head: Mutex::new(sentinel),
            tail: Mutex::new(sentinel),
            not_empty: Condvar::new(),
            waiters: AtomicUsize::new(0),
            len: AtomicUsize::new(0),
        }
    }

    /// Inserts an element at the back of the queue.
    pub fn push(&self, value: T) {
        let node = Node::new(Some(value));
        // Counted before publication, so a racing pop's decrement cannot
        // wrap the counter; it may overshoot briefly instead.
        self.len.fetch_add(1, Ordering::SeqCst);
        {
            let mut tail = self.tail.lock().unwrap();
            // SeqCst store: consumers registered in `waiters` probe this
            // link without holding the tail lock, see `wait_and_pop`.
            unsafe { (**tail).next.store(node, Ordering::SeqCst) };
            *tail = node;
        }

        if self.waiters.load(Ordering::SeqCst) != 0 {
            // Taking the head mutex between the publication and the notify
            // ensures a consumer that found the queue empty is already
            // parked by the time the notification fires.
            drop(self.head.lock().unwrap());
            self.not_empty.notify_one();
        }
    }

    /// Removes the front element, or returns `None` if the queue is empty.
    pub fn try_pop(&self) -> Option<T> {
        let mut head = self.head.lock().unwrap();
        unsafe { self.pop_front(&mut head) }
    }

    /// Removes the front element, blocking while the queue is empty.
    pub fn wait_and_pop(&self) -> T {
        let mut head = self.head.lock().unwrap();
        loop {
            if let Some(value) = unsafe { self.pop_front(&mut head) } {
                return value;
            }

            // Register as a waiter, then probe once more: a producer that
            // missed the registration must have published before it, and a
            // producer that sees it will knock on the head mutex.
            self.waiters.fetch_add(1, Ordering::SeqCst);
            if let Some(value) = unsafe { self.pop_front(&mut head) } {
                self.waiters.fetch_sub(1, Ordering::SeqCst);
                return value;
            }
            head = self.not_empty.wait(head).unwrap();
            self.waiters.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Returns the number of elements in the queue.
    ///
    /// The count is read from a separate counter and may lag operations
    /// still in flight.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::SeqCst)
    }

    /// Returns `true` if the queue is observed empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retires the sentinel and takes the value of its successor, which
    /// becomes the new sentinel.
    ///
    /// Must be called with the head mutex held (`head` is the guarded
    /// sentinel pointer).
    unsafe fn pop_front(&self, head: &mut *mut Node<T>) -> Option<T> {
        let sentinel = *head;
        let next = (*sentinel).next.load(Ordering::SeqCst);
        if next.is_null() {
            return None;
        }

        // The successor is fully initialized: its publication happened
        // before the link store we just observed. Only its value field is
        // touched here; a producer extending the chain writes its `next`
        // field, never its value.
        let value = (*next).value.take();
        *head = next;

        // The old sentinel is unreachable now: the tail cursor is at least
        // at `next`, so no producer holds a pointer to it.
        drop(Box::from_raw(sentinel));
        self.len.fetch_sub(1, Ordering::SeqCst);
        value
    }
}

impl<T> Drop for LinkedQueue<T> {
    fn drop(&mut self) {
        // Walk the chain iteratively; a recursive drop of long chains
        // would overflow the stack.
        let mut node = *self.head.get_mut().unwrap();
        while !node.is_null() {
            unsafe {
                let mut boxed = Box::from_raw(node);
                node = *boxed.next.get_mut();
            }
        }
    }
}

impl<T: Send> Queue<T> for LinkedQueue<T> {
    type PushError = Infallible;

    fn push(&self, value: T) -> Result<(), Infallible> {
        LinkedQueue::push(self, value);
        Ok(())
    }

    fn try_pop(&self) -> Option<T> {
        LinkedQueue::try_pop(self)
    }

    fn len(&self) -> usize {
        LinkedQueue::len(self)
    }
}

impl<T: Send> BlockingQueue<T> for LinkedQueue<T> {
    fn wait_and_pop(&self) -> T {
        LinkedQueue::wait_and_pop(self)
    }
}

impl<T> Default for LinkedQueue<T> {
    fn default() -> LinkedQueue<T> {
        LinkedQueue::new()
    }
}

impl<T> fmt::Debug for LinkedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("LinkedQueue { .. }")
    }
}
