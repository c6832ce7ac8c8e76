//! Building blocks for multi-threaded programs.
//!
//! This crate is an umbrella over three smaller crates:
//!
//! * [`queue`] re-exports [`conflux-queue`], a family of thread-safe
//!   queues sharing one behavioral contract: coarse and two-lock FIFOs, a
//!   bounded backpressure wrapper, a segmented FIFO, lock-free queues, a
//!   priority queue, a delay queue, and a batch queue.
//! * [`steal`] re-exports [`conflux-steal`], a hierarchical priority
//!   queue with per-thread heaps, a global overflow heap, and batch
//!   work-stealing.
//! * [`parallel`] re-exports [`conflux-parallel`], data-parallel
//!   `accumulate`, `prefix_scan`, `for_each`, and `merge_sort` built on
//!   scoped worker threads.
//!
//! [`conflux-queue`]: https://docs.rs/conflux-queue
//! [`conflux-steal`]: https://docs.rs/conflux-steal
//! [`conflux-parallel`]: https://docs.rs/conflux-parallel
//!
//! # Examples
//!
//! Fan work out to consumers through a queue:
//!
//! ```
//! use conflux::queue::MutexQueue;
//! use crossbeam_utils::thread;
//!
//! let q = MutexQueue::new();
//!
//! thread::scope(|scope| {
//!     scope.spawn(|_| {
//!         for i in 0..100 {
//!             q.push(i);
//!         }
//!     });
//!
//!     let mut total = 0;
//!     for _ in 0..100 {
//!         total += q.wait_and_pop();
//!     }
//!     assert_eq!(total, 4950);
//! })
//! .unwrap();
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

/// Concurrent queues.
pub mod queue {
    pub use conflux_queue::{
        BatchQueue, BlockingQueue, Bounded, BoundedQueue, DelayQueue, LinkedQueue, MsQueue,
        MutexQueue, PriorityQueue, PushError, Queue, RingQueue, SegmentedQueue, TreiberStack,
    };
}

/// The work-stealing hierarchical priority queue.
pub mod steal {
    pub use conflux_steal::StealHeap;
}

/// Data-parallel algorithms.
pub mod parallel {
    pub use conflux_parallel::{
        accumulate, for_each, for_each_dynamic, merge_sort, merge_sort_with, ops, prefix_scan,
        BinaryOp,
    };
}

pub use crate::queue::{BlockingQueue, Queue};
