//! A hierarchical priority queue with batch work-stealing.
//!
//! [`StealHeap`] keeps priority-ordered consumption scalable by keeping
//! each thread's hot path on its own heap:
//!
//! * Every pushing thread lazily acquires a **local heap**, guarded by its
//!   own lock and touched by other threads only to steal or to drain.
//! * A **global heap** receives a local heap's whole content whenever it
//!   grows past a threshold, publishing that work to every consumer.
//! * A consumer that finds both its local heap and the global heap empty
//!   **steals** a batch from another thread's local heap, keeps the best
//!   element and spills the rest into its own heap.
//!
//! The price of scalability is strict ordering: elements are returned in
//! priority order *per heap*, but a pop takes the maximum of some visible
//! subset, not necessarily the global maximum. Every element is still
//! returned exactly once.
//!
//! # Examples
//!
//! ```
//! use conflux_steal::StealHeap;
//!
//! let heap = StealHeap::new();
//!
//! heap.push(3);
//! heap.push(7);
//! heap.push(5);
//!
//! assert_eq!(heap.try_pop(), Some(7));
//! assert_eq!(heap.try_pop(), Some(5));
//! assert_eq!(heap.try_pop(), Some(3));
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

mod local;
mod tls;

use core::convert::Infallible;
use core::fmt;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, ThreadId};
use std::time::Duration;

use conflux_queue::{BlockingQueue, Queue};

use crate::local::LocalHeap;

/// The default local-heap size that triggers a drain into the global heap.
pub const DEFAULT_LOCAL_THRESHOLD: usize = 100;

/// The default maximum number of elements taken by one steal.
pub const DEFAULT_MAX_STEAL: usize = 10;

/// The default timeout of one blocking-pop wait round.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(100);

struct Shared<T> {
    global: Mutex<BinaryHeap<T>>,
    global_cv: Condvar,

    /// Strong ownership of every thread's local heap.
    registry: Mutex<HashMap<ThreadId, Arc<LocalHeap<T>>>>,

    /// Local heaps currently known to hold elements.
    active: Mutex<Vec<Arc<LocalHeap<T>>>>,

    /// Mirror of `active.len()`, so the blocking-pop predicate can consult
    /// it without taking the list mutex while holding the global mutex
    /// (the lock order is list, then global, then local).
    active_len: AtomicUsize,

    local_threshold: usize,
    max_steal: usize,
    wait_timeout: Duration,
}

/// A priority queue with per-thread heaps, a global overflow heap, and
/// batch work-stealing.
///
/// Elements are ordered by `T`'s ordering, greatest first; wrap elements
/// in [`core::cmp::Reverse`] for smallest-first order. See the [crate
/// docs](crate) for the design and its ordering guarantees.
pub struct StealHeap<T: Ord + Send + 'static> {
    shared: Arc<Shared<T>>,
}

impl<T: Ord + Send + 'static> StealHeap<T> {
    /// Creates a new empty heap with the default configuration.
    pub fn new() -> StealHeap<T> {
        StealHeap::with_config(
            DEFAULT_LOCAL_THRESHOLD,
            DEFAULT_MAX_STEAL,
            DEFAULT_WAIT_TIMEOUT,
        )
    }

    /// Creates a new empty heap.
    ///
    /// A local heap reaching `local_threshold` elements is drained into
    /// the global heap; one steal moves at most `max_steal` elements; a
    /// blocked consumer re-examines the world every `wait_timeout`.
    ///
    /// # Panics
    ///
    /// Panics if `local_threshold` or `max_steal` is zero.
    pub fn with_config(
        local_threshold: usize,
        max_steal: usize,
        wait_timeout: Duration,
    ) -> StealHeap<T> {
        assert!(local_threshold > 0, "local threshold must be greater than zero");
        assert!(max_steal > 0, "max steal must be greater than zero");
        StealHeap {
            shared: Arc::new(Shared {
                global: Mutex::new(BinaryHeap::new()),
                global_cv: Condvar::new(),
                registry: Mutex::new(HashMap::new()),
                active: Mutex::new(Vec::new()),
                active_len: AtomicUsize::new(0),
                local_threshold,
                max_steal,
                wait_timeout,
            }),
        }
    }

    /// Inserts an element into the calling thread's local heap.
    ///
    /// Crossing the local threshold drains the whole local heap into the
    /// global heap and wakes blocked consumers.
    pub fn push(&self, value: T) {
        let local = self.local();

        let (was_empty, len) = {
            let mut heap = local.heap.lock().unwrap();
            let was_empty = heap.is_empty();
            heap.push(value);
            (was_empty, heap.len())
        };

        if len >= self.shared.local_threshold {
            self.drain_into_global(&local);
        } else if was_empty {
            self.activate(&local);
        }
    }

    /// Removes an element, or returns `None` if no tier yields one.
    ///
    /// Tiers are tried in order: the calling thread's local heap, the
    /// global heap, then a steal from another thread's local heap. The
    /// element returned is the greatest of the first tier that yields one.
    pub fn try_pop(&self) -> Option<T> {
        // Fast path: our own heap, if this thread ever pushed here.
        if let Some(local) = tls::get::<T>(self.key()) {
            if local.active.load(Ordering::Acquire) {
                let value = local.heap.lock().unwrap().pop();
                if value.is_some() {
                    self.deactivate_if_empty(&local);
                    return value;
                }
            }
        }

        {
            let mut global = self.shared.global.lock().unwrap();
            if let Some(value) = global.pop() {
                return Some(value);
            }
        }

        self.steal()
    }

    /// Removes an element, blocking until one is available.
    ///
    /// The wait is timed: even if a wake-up is missed (for example, an
    /// element pushed to a remote local heap publishes no notification),
    /// the consumer re-examines all three tiers every `wait_timeout`.
    pub fn wait_and_pop(&self) -> T {
        loop {
            if let Some(value) = self.try_pop() {
                return value;
            }

            let shared = &self.shared;
            let global = shared.global.lock().unwrap();
            // Re-check under the global lock; a drain may have landed
            // since the failed try_pop.
            if !global.is_empty()
                || shared.active_len.load(Ordering::Acquire) > 0
                || self.own_heap_active()
            {
                continue;
            }
            let _ = shared
                .global_cv
                .wait_timeout(global, shared.wait_timeout)
                .unwrap();
        }
    }

    /// Returns the number of elements across all heaps.
    ///
    /// Each heap is read under its own lock but there is no global
    /// snapshot: the result is an estimate, not a linearization point.
    pub fn len(&self) -> usize {
        let mut count = self.shared.global.lock().unwrap().len();
        let locals: Vec<_> = {
            let registry = self.shared.registry.lock().unwrap();
            registry.values().cloned().collect()
        };
        for local in locals {
            count += local.heap.lock().unwrap().len();
        }
        count
    }

    /// Returns `true` if every tier is observed empty.
    pub fn is_empty(&self) -> bool {
        if self.own_heap_active() {
            return false;
        }
        if !self.shared.global.lock().unwrap().is_empty() {
            return false;
        }
        self.shared.active_len.load(Ordering::Acquire) == 0
    }

    /// The key identifying this instance in the thread-local table.
    fn key(&self) -> usize {
        Arc::as_ptr(&self.shared) as usize
    }

    fn own_heap_active(&self) -> bool {
        tls::get::<T>(self.key())
            .map(|local| local.active.load(Ordering::Acquire))
            .unwrap_or(false)
    }

    /// Returns the calling thread's local heap, registering one on first
    /// touch.
    fn local(&self) -> Arc<LocalHeap<T>> {
        if let Some(local) = tls::get::<T>(self.key()) {
            return local;
        }

        let local = Arc::new(LocalHeap::new(thread::current().id()));
        self.shared
            .registry
            .lock()
            .unwrap()
            .insert(local.owner, local.clone());

        // The drain guard runs at thread exit: leftover local work moves
        // into the global heap where other threads can see it, and the
        // heap is deregistered. Weak handles keep an outliving instance
        // from being retained by exited threads.
        let weak_shared = Arc::downgrade(&self.shared);
        let weak_local = Arc::downgrade(&local);
        tls::register(
            self.key(),
            &local,
            Box::new(move || {
                if let (Some(shared), Some(local)) = (weak_shared.upgrade(), weak_local.upgrade()) {
                    retire(&shared, &local);
                }
            }),
        );

        local
    }

    /// Puts `local` on the active list if it holds elements.
    ///
    /// The flag and the list entry change together under the list mutex.
    fn activate(&self, local: &Arc<LocalHeap<T>>) {
        let mut active = self.shared.active.lock().unwrap();
        if !local.active.load(Ordering::Relaxed) {
            let heap = local.heap.lock().unwrap();
            if !heap.is_empty() {
                local.active.store(true, Ordering::Release);
                active.push(local.clone());
                self.shared.active_len.store(active.len(), Ordering::Release);
            }
        }
    }

    /// Takes `local` off the active list if it has drained.
    fn deactivate_if_empty(&self, local: &Arc<LocalHeap<T>>) {
        let mut active = self.shared.active.lock().unwrap();
        if local.active.load(Ordering::Relaxed) {
            let heap = local.heap.lock().unwrap();
            if heap.is_empty() {
                local.active.store(false, Ordering::Release);
                active.retain(|h| !Arc::ptr_eq(h, local));
                self.shared.active_len.store(active.len(), Ordering::Release);
            }
        }
    }

    /// Moves the whole content of `local` into the global heap and wakes
    /// blocked consumers.
    fn drain_into_global(&self, local: &Arc<LocalHeap<T>>) {
        let shared = &self.shared;

        // Lock order: active list, global, local.
        {
            let mut active = shared.active.lock().unwrap();
            let mut global = shared.global.lock().unwrap();
            let mut heap = local.heap.lock().unwrap();

            if local.active.load(Ordering::Relaxed) {
                local.active.store(false, Ordering::Release);
                active.retain(|h| !Arc::ptr_eq(h, local));
                shared.active_len.store(active.len(), Ordering::Release);
            }
            global.extend(heap.drain());
        }

        // A drain publishes many elements; several waiters may now be
        // satisfiable.
        shared.global_cv.notify_all();
    }

    /// Steals a batch from another thread's local heap.
    ///
    /// Keeps the greatest stolen element as the return value and spills
    /// the remainder into the calling thread's own heap. The result is
    /// the best of the sampled victim's batch, not a global maximum.
    fn steal(&self) -> Option<T> {
        let shared = &self.shared;

        let candidates: Vec<Arc<LocalHeap<T>>> = {
            let active = shared.active.lock().unwrap();
            if active.is_empty() {
                return None;
            }
            active.clone()
        };

        let me = thread::current().id();
        for victim in candidates {
            if victim.owner == me {
                continue;
            }

            let mut batch = BinaryHeap::new();
            {
                let mut heap = victim.heap.lock().unwrap();
                for _ in 0..shared.max_steal {
                    match heap.pop() {
                        Some(value) => batch.push(value),
                        None => break,
                    }
                }
            }
            self.deactivate_if_empty(&victim);

            let best = match batch.pop() {
                Some(best) => best,
                None => continue,
            };

            if !batch.is_empty() {
                let local = self.local();
                let was_empty = {
                    let mut heap = local.heap.lock().unwrap();
                    let was_empty = heap.is_empty();
                    heap.extend(batch);
                    was_empty
                };
                if was_empty {
                    self.activate(&local);
                }
            }

            return Some(best);
        }

        None
    }
}

/// Thread-exit cleanup: drain the local heap into the global heap,
/// deregister it, and wake consumers that can now see the work.
fn retire<T: Ord + Send>(shared: &Arc<Shared<T>>, local: &Arc<LocalHeap<T>>) {
    {
        let mut active = shared.active.lock().unwrap();
        let mut global = shared.global.lock().unwrap();
        let mut heap = local.heap.lock().unwrap();

        if local.active.load(Ordering::Relaxed) {
            local.active.store(false, Ordering::Release);
            active.retain(|h| !Arc::ptr_eq(h, local));
            shared.active_len.store(active.len(), Ordering::Release);
        }
        global.extend(heap.drain());
    }

    shared.registry.lock().unwrap().remove(&local.owner);
    shared.global_cv.notify_all();
}

impl<T: Ord + Send + 'static> Queue<T> for StealHeap<T> {
    type PushError = Infallible;

    fn push(&self, value: T) -> Result<(), Infallible> {
        StealHeap::push(self, value);
        Ok(())
    }

    fn try_pop(&self) -> Option<T> {
        StealHeap::try_pop(self)
    }

    fn len(&self) -> usize {
        StealHeap::len(self)
    }

    fn is_empty(&self) -> bool {
        StealHeap::is_empty(self)
    }
}

impl<T: Ord + Send + 'static> BlockingQueue<T> for StealHeap<T> {
    fn wait_and_pop(&self) -> T {
        StealHeap::wait_and_pop(self)
    }
}

impl<T: Ord + Send + 'static> Default for StealHeap<T> {
    fn default() -> StealHeap<T> {
        StealHeap::new()
    }
}

impl<T: Ord + Send + 'static> fmt::Debug for StealHeap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("StealHeap { .. }")
    }
}
