use std::collections::BinaryHeap;
use std::sync::atomic::AtomicBool;
use std::sync::Mutex;
use std::thread::ThreadId;

/// A per-thread heap together with its sharing state.
///
/// The owning thread pushes and pops through its own lock on the fast
/// path; other threads take the same lock occasionally, to steal a batch
/// or to drain the heap when its owner exits.
pub(crate) struct LocalHeap<T> {
    /// The thread this heap belongs to. Stealers skip their own heap.
    pub(crate) owner: ThreadId,

    pub(crate) heap: Mutex<BinaryHeap<T>>,

    /// Mirrors membership in the shared active list. Written only while
    /// the active-list mutex is held; read lock-free on fast paths.
    pub(crate) active: AtomicBool,
}

impl<T: Ord> LocalHeap<T> {
    pub(crate) fn new(owner: ThreadId) -> LocalHeap<T> {
        LocalHeap {
            owner,
            heap: Mutex::new(BinaryHeap::new()),
            active: AtomicBool::new(false),
        }
    }
}
