//! Thread-local handles to per-thread heaps.
//!
//! The registry inside each [`StealHeap`](crate::StealHeap) owns the
//! local heaps; threads keep only weak handles here, keyed by the
//! instance's address. The table's destructor runs at thread exit and
//! fires each registration's drain callback, which moves any leftover
//! local work into the instance's global heap.

use std::any::Any;
use std::cell::RefCell;
use std::sync::{Arc, Weak};

use crate::local::LocalHeap;

struct Registration {
    /// Address of the owning instance's shared state.
    key: usize,

    /// A `Weak<LocalHeap<T>>`, erased so one table serves every element
    /// type.
    handle: Box<dyn Any>,

    /// Drains the local heap into the instance's global heap; run at
    /// thread exit.
    drain: Box<dyn FnMut()>,
}

struct Guards(Vec<Registration>);

impl Drop for Guards {
    fn drop(&mut self) {
        for reg in &mut self.0 {
            (reg.drain)();
        }
    }
}

thread_local! {
    static REGISTRATIONS: RefCell<Guards> = RefCell::new(Guards(Vec::new()));
}

/// Returns this thread's local heap for the instance at `key`, if one is
/// registered and the instance is still alive.
pub(crate) fn get<T: 'static>(key: usize) -> Option<Arc<LocalHeap<T>>> {
    REGISTRATIONS.with(|regs| {
        let mut regs = regs.borrow_mut();
        let idx = regs.0.iter().position(|reg| reg.key == key)?;
        let weak = regs.0[idx].handle.downcast_ref::<Weak<LocalHeap<T>>>()?;
        match weak.upgrade() {
            Some(local) => Some(local),
            None => {
                // The instance that owned this registration is gone and a
                // newly created one reuses its address. Drop the stale
                // entry so the caller can register afresh.
                regs.0.swap_remove(idx);
                None
            }
        }
    })
}

/// Registers this thread's local heap for the instance at `key`.
pub(crate) fn register<T: 'static>(key: usize, local: &Arc<LocalHeap<T>>, drain: Box<dyn FnMut()>) {
    let handle: Box<dyn Any> = Box::new(Arc::downgrade(local));
    REGISTRATIONS.with(|regs| {
        regs.borrow_mut().0.push(Registration { key, handle, drain });
    });
}
