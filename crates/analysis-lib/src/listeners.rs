//! Observer registries with snapshot-on-notify semantics
//!
//! A `Listeners` handle is cheap to clone and every clone shares the same
//! list. Notification iterates over a snapshot taken before the first
//! callback, so a listener may add or remove listeners (through its own clone
//! of the handle) while being notified. Changes take effect from the next
//! notification onward.

use std::sync::{Arc, RwLock};

/// Shared, ordered list of listeners of type `L`
pub struct Listeners<L: ?Sized> {
    inner: Arc<RwLock<Vec<Arc<L>>>>,
}

impl<L: ?Sized> Clone for Listeners<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: ?Sized> Default for Listeners<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> Listeners<L> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register a listener; it is notified after all earlier registrations
    pub fn add(&self, listener: Arc<L>) {
        let mut listeners = self.inner.write().unwrap_or_else(|e| e.into_inner());
        listeners.push(listener);
    }

    /// Unregister a listener by identity. Returns whether it was registered.
    pub fn remove(&self, listener: &Arc<L>) -> bool {
        let mut listeners = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let target = Arc::as_ptr(listener) as *const ();
        match listeners
            .iter()
            .position(|l| Arc::as_ptr(l) as *const () == target)
        {
            Some(idx) => {
                listeners.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke `f` on every listener in registration order
    pub fn notify(&self, mut f: impl FnMut(&L)) {
        let snapshot: Vec<Arc<L>> = self
            .inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        for listener in &snapshot {
            f(listener);
        }
    }
}
