use core::fmt;
use core::mem::ManuallyDrop;
use core::ptr;
use std::sync::atomic::Ordering;

use crossbeam_epoch::{self as epoch, Atomic, Owned};

/// A node in the stack.
struct Node<T> {
    value: ManuallyDrop<T>,
    next: Atomic<Node<T>>,
}

/// Treiber's lock-free stack.
///
/// The LIFO companion to the queues in this crate: any number of threads
/// may push and pop concurrently, racing on a single CAS over the top
/// pointer. Popped nodes are reclaimed with epoch-based garbage
/// collection.
///
/// # Examples
///
/// ```
/// use conflux_queue::TreiberStack;
///
/// let s = TreiberStack::new();
///
/// s.push(1);
/// s.push(2);
///
/// assert_eq!(s.try_pop(), Some(2));
/// assert_eq!(s.try_pop(), Some(1));
/// assert_eq!(s.try_pop(), None);
/// ```
pub struct TreiberStack<T> {
    head: Atomic<Node<T>>,
}

unsafe impl<T: Send> Send for TreiberStack<T> {}
unsafe impl<T: Send> Sync for TreiberStack<T> {}

impl<T> TreiberStack<T> {
    /// Creates a new empty stack.
    pub fn new() -> TreiberStack<T> {
        TreiberStack {
            head: Atomic::null(),
        }
    }

    /// Pushes an element on top of the stack.
    pub fn push(&self, value: T) {
        let mut node = Owned::new(Node {
            value: ManuallyDrop::new(value),
            next: Atomic::null(),
        });

        let guard = &epoch::pin();
        loop {
            let head = self.head.load(Ordering::Relaxed, guard);
            node.next.store(head, Ordering::Relaxed);
            match self
                .head
                .compare_exchange(head, node, Ordering::Release, Ordering::Relaxed, guard)
            {
                Ok(_) => return,
                Err(e) => node = e.new,
            }
        }
    }

    /// Removes the top element, or returns `None` if the stack is
    /// observed empty.
    pub fn try_pop(&self) -> Option<T> {
        let guard = &epoch::pin();
        loop {
            let head = self.head.load(Ordering::Acquire, guard);
            match unsafe { head.as_ref() } {
                Some(h) => {
                    let next = h.next.load(Ordering::Relaxed, guard);
                    if self
                        .head
                        .compare_exchange(head, next, Ordering::Release, Ordering::Relaxed, guard)
                        .is_ok()
                    {
                        unsafe {
                            guard.defer_destroy(head);
                            return Some(ManuallyDrop::into_inner(ptr::read(&h.value)));
                        }
                    }
                }
                None => return None,
            }
        }
    }

    /// Returns `true` if the stack is observed empty.
    pub fn is_empty(&self) -> bool {
        let guard = &epoch::pin();
        self.head.load(Ordering::Acquire, guard).is_null()
    }
}

impl<T> Drop for TreiberStack<T> {
    fn drop(&mut self) {
        unsafe {
            let guard = epoch::unprotected();
            let mut node = self.head.load(Ordering::Relaxed, guard);
            while let Some(n) = node.as_ref() {
                let next = n.next.load(Ordering::Relaxed, guard);
                let mut owned = node.into_owned();
                ManuallyDrop::drop(&mut owned.value);
                drop(owned);
                node = next;
            }
        }
    }
}

impl<T> Default for TreiberStack<T> {
    fn default() -> TreiberStack<T> {
        TreiberStack::new()
    }
}

impl<T> fmt::Debug for TreiberStack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("TreiberStack { .. }")
    }
}
