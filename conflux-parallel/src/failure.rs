use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A first-panic-wins cell shared by the workers of one parallel call.
///
/// Workers run their tasks through [`run`](FirstFailure::run); the first
/// captured panic payload is kept and the cell trips, which cancelling
/// algorithms poll at task boundaries. After every worker has been
/// joined, [`rethrow`](FirstFailure::rethrow) re-raises the payload at
/// the call site.
pub(crate) struct FirstFailure {
    slot: Mutex<Option<Box<dyn Any + Send + 'static>>>,
    tripped: AtomicBool,
}

impl FirstFailure {
    pub(crate) fn new() -> FirstFailure {
        FirstFailure {
            slot: Mutex::new(None),
            tripped: AtomicBool::new(false),
        }
    }

    /// Runs `f`, capturing a panic into the cell.
    pub(crate) fn run<F: FnOnce()>(&self, f: F) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
            self.record(payload);
        }
    }

    /// Stores `payload` unless an earlier panic already won.
    pub(crate) fn record(&self, payload: Box<dyn Any + Send + 'static>) {
        let mut slot = self.slot.lock().unwrap();
        if slot.is_none() {
            *slot = Some(payload);
        }
        self.tripped.store(true, Ordering::Release);
    }

    /// Returns `true` once any worker has panicked.
    pub(crate) fn tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    /// Re-raises the captured panic, if any. Call only after every worker
    /// has been joined.
    pub(crate) fn rethrow(&self) {
        let payload = self.slot.lock().unwrap().take();
        if let Some(payload) = payload {
            panic::resume_unwind(payload);
        }
    }
}
