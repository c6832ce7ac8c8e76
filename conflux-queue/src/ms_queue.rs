use core::convert::Infallible;
use core::fmt;
use core::mem::MaybeUninit;
use core::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_epoch::{self as epoch, Atomic, Owned, Shared};
use crossbeam_utils::{Backoff, CachePadded};

use crate::Queue;

/// A node in the linked list.
struct Node<T> {
    /// The payload. The sentinel node's slot is vacant: either it never
    /// held a value (the initial sentinel) or its value was moved out when
    /// the node was promoted to sentinel by a pop.
    value: MaybeUninit<T>,

    next: Atomic<Node<T>>,
}

/// An unbounded lock-free FIFO queue.
///
/// This is the Michael-Scott queue: a singly-linked list with a sentinel
/// node, where producers race with a CAS on the tail's successor link and
/// consumers race with a CAS on the head pointer. Retired sentinels are
/// reclaimed with epoch-based garbage collection, so concurrent readers
/// never observe freed memory.
///
/// The queue is linearizable. `len` is tracked on a separate counter and
/// may lag operations still in flight.
///
/// # Examples
///
/// ```
/// use conflux_queue::MsQueue;
///
/// let q = MsQueue::new();
///
/// q.push(1);
/// q.push(2);
///
/// assert_eq!(q.try_pop(), Some(1));
/// assert_eq!(q.try_pop(), Some(2));
/// assert_eq!(q.try_pop(), None);
/// ```
pub struct MsQueue<T> {
    head: CachePadded<Atomic<Node<T>>>,
    tail: CachePadded<Atomic<Node<T>>>,
    len: CachePadded<AtomicUsize>,
}

unsafe impl<T: Send> Send for MsQueue<T> {}
unsafe impl<T: Send> Sync for MsQueue<T> {}

impl<T> MsQueue<T> {
    /// Creates a new empty queue.
    pub fn new() -> MsQueue<T> {
        let queue = MsQueue {
            head: CachePadded::new(Atomic::null()),
            tail: CachePadded::new(Atomic::null()),
            len: CachePadded::new(AtomicUsize::new(0)),
        };

        let sentinel = Owned::new(Node {
            value: MaybeUninit::uninit(),
            next: Atomic::null(),
        });

        unsafe {
            let guard = epoch::unprotected();
            let sentinel = sentinel.into_shared(guard);
            queue.head.store(sentinel, Ordering::Relaxed);
            queue.tail.store(sentinel, Ordering::Relaxed);
        }
        queue
    }

    /// Inserts an element at the back of the queue.
    pub fn push(&self, value: T) {
        // Counted before publication: the release store that publishes the
        // node makes this increment visible to the consumer that pops it,
        // so the counter can overshoot briefly but never wrap below zero.
        self.len.fetch_add(1, Ordering::Relaxed);

        let guard = &epoch::pin();
        let new = Owned::new(Node {
            value: MaybeUninit::new(value),
            next: Atomic::null(),
        })
        .into_shared(guard);

        let backoff = Backoff::new();
        loop {
            let tail = self.tail.load(Ordering::Acquire, guard);
            let t = unsafe { tail.deref() };
            let next = t.next.load(Ordering::Acquire, guard);

            // The tail pointer lags behind the true last node whenever a
            // producer has linked a node but not yet swung the tail. Help
            // it along and retry.
            if !next.is_null() {
                let _ = self.tail.compare_exchange(
                    tail,
                    next,
                    Ordering::Release,
                    Ordering::Relaxed,
                    guard,
                );
                continue;
            }

            if t.next
                .compare_exchange(
                    Shared::null(),
                    new,
                    Ordering::Release,
                    Ordering::Relaxed,
                    guard,
                )
                .is_ok()
            {
                let _ = self.tail.compare_exchange(
                    tail,
                    new,
                    Ordering::Release,
                    Ordering::Relaxed,
                    guard,
                );
                return;
            }

            backoff.spin();
        }
    }

    /// Removes the front element, or returns `None` if the queue is
    /// observed empty.
    pub fn try_pop(&self) -> Option<T> {
        let guard = &epoch::pin();
        let backoff = Backoff::new();
        loop {
            let head = self.head.load(Ordering::Acquire, guard);
            let h = unsafe { head.deref() };
            let next = h.next.load(Ordering::Acquire, guard);

            let n = match unsafe { next.as_ref() } {
                Some(n) => n,
                None => return None,
            };

            if self
                .head
                .compare_exchange(head, next, Ordering::Release, Ordering::Relaxed, guard)
                .is_ok()
            {
                unsafe {
                    // The successor becomes the new sentinel; its value
                    // moves out to the caller. The old sentinel is retired
                    // once every pinned thread has moved on.
                    let value = n.value.as_ptr().read();
                    guard.defer_destroy(head);
                    self.len.fetch_sub(1, Ordering::Relaxed);
                    return Some(value);
                }
            }

            backoff.spin();
        }
    }

    /// Returns `true` if the queue is observed empty.
    pub fn is_empty(&self) -> bool {
        let guard = &epoch::pin();
        let head = self.head.load(Ordering::Acquire, guard);
        let h = unsafe { head.deref() };
        h.next.load(Ordering::Acquire, guard).is_null()
    }

    /// Returns the number of elements in the queue.
    ///
    /// The count is read from a separate counter and may lag operations
    /// still in flight.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }
}

impl<T> Drop for MsQueue<T> {
    fn drop(&mut self) {
        unsafe {
            let guard = epoch::unprotected();

            // The first node is the sentinel and holds no value; every
            // node after it does.
            let mut node = self.head.load(Ordering::Relaxed, guard);
            if let Some(sentinel) = node.as_ref() {
                let next = sentinel.next.load(Ordering::Relaxed, guard);
                drop(node.into_owned());
                node = next;

                while let Some(n) = node.as_ref() {
                    let next = n.next.load(Ordering::Relaxed, guard);
                    let mut owned = node.into_owned();
                    ptr::drop_in_place(owned.value.as_mut_ptr());
                    drop(owned);
                    node = next;
                }
            }
        }
    }
}

impl<T: Send> Queue<T> for MsQueue<T> {
    type PushError = Infallible;

    fn push(&self, value: T) -> Result<(), Infallible> {
        MsQueue::push(self, value);
        Ok(())
    }

    fn try_pop(&self) -> Option<T> {
        MsQueue::try_pop(self)
    }

    fn len(&self) -> usize {
        MsQueue::len(self)
    }

    fn is_empty(&self) -> bool {
        MsQueue::is_empty(self)
    }
}

impl<T> Default for MsQueue<T> {
    fn default() -> MsQueue<T> {
        MsQueue::new()
    }
}

impl<T> fmt::Debug for MsQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("MsQueue { .. }")
    }
}
