//! Concurrent queues.
//!
//! This crate provides a family of thread-safe queues sharing one
//! behavioral contract, from the simplest correct design to lock-free
//! variants:
//!
//! * [`MutexQueue`], an unbounded FIFO guarded by a single mutex; the
//!   baseline every other variant is measured against.
//! * [`LinkedQueue`], an unbounded FIFO with disjoint head and tail locks,
//!   so producers and consumers scale independently.
//! * [`Bounded`], a capacity wrapper that adds backpressure to any
//!   unbounded queue ([`BoundedQueue`] is the common instantiation).
//! * [`SegmentedQueue`], an unbounded FIFO built from fixed-size ring
//!   segments with one lock per segment.
//! * [`MsQueue`], an unbounded lock-free Michael-Scott queue.
//! * [`RingQueue`], a bounded lock-free MPMC ring buffer.
//! * [`PriorityQueue`], a heap-ordered queue, optionally bounded.
//! * [`DelayQueue`], a queue whose elements become visible only after a
//!   per-element delay expires.
//! * [`BatchQueue`], a queue optimized for bursty batch producers and
//!   consumers.
//! * [`TreiberStack`], a lock-free LIFO companion to the queues.
//!
//! The FIFO variants implement the [`Queue`] contract, and those that can
//! block a consumer additionally implement [`BlockingQueue`].

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

mod batch;
mod bounded;
mod delay;
mod err;
mod linked_queue;
mod ms_queue;
mod mutex_queue;
mod priority;
mod ring_queue;
mod segmented;
mod stack;

pub use self::batch::BatchQueue;
pub use self::bounded::{Bounded, BoundedQueue};
pub use self::delay::DelayQueue;
pub use self::err::PushError;
pub use self::linked_queue::LinkedQueue;
pub use self::ms_queue::MsQueue;
pub use self::mutex_queue::MutexQueue;
pub use self::priority::PriorityQueue;
pub use self::ring_queue::RingQueue;
pub use self::segmented::SegmentedQueue;
pub use self::stack::TreiberStack;

/// The operation set shared by the queues in this crate.
///
/// A queue is a thread-safe multi-producer multi-consumer collection.
/// Whether `push` can fail is encoded in the associated `PushError` type:
/// unbounded queues use [`core::convert::Infallible`], while bounded
/// variants return the rejected element inside [`PushError`].
///
/// `len` may be approximate for variants whose state is spread over
/// several locks; each implementation documents its precision.
pub trait Queue<T: Send>: Send + Sync {
    /// The error returned when the queue cannot accept an element.
    type PushError;

    /// Inserts an element at the back of the queue.
    fn push(&self, value: T) -> Result<(), Self::PushError>;

    /// Removes the front element, or returns `None` if the queue is
    /// observed empty.
    fn try_pop(&self) -> Option<T>;

    /// Returns the number of elements in the queue.
    fn len(&self) -> usize;

    /// Returns `true` if the queue is observed empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Queues that can block a consumer until an element arrives.
pub trait BlockingQueue<T: Send>: Queue<T> {
    /// Removes the front element, blocking while the queue is empty.
    fn wait_and_pop(&self) -> T;
}
