//! The setter handed to a store's initializer.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tracing::warn;

use super::store::{Shared, Store};
use crate::error::StoreError;
use crate::state::State;

/// Updates a store from code that lives inside its own state.
///
/// The handle only holds a weak reference, so a state whose action closures
/// capture it does not keep the store alive. Updates made through it behave
/// exactly like [`Store::set_state`] and [`Store::update_state`].
pub struct SetState<S: State> {
    shared: Weak<Shared<S>>,
    /// Set once the initializer has returned.
    ready: Arc<AtomicBool>,
}

impl<S: State> SetState<S> {
    pub(crate) fn new(shared: Weak<Shared<S>>, ready: Arc<AtomicBool>) -> Self {
        Self { shared, ready }
    }

    fn upgrade(&self) -> Result<Arc<Shared<S>>, StoreError> {
        self.shared.upgrade().ok_or_else(|| {
            let error = if self.ready.load(Ordering::Acquire) {
                StoreError::Dropped
            } else {
                StoreError::Uninitialized
            };
            warn!(%error, "state update rejected");
            error
        })
    }

    /// Merge a partial update onto the state and notify every listener.
    pub fn set(&self, partial: S::Partial) -> Result<(), StoreError> {
        self.update(move |_| partial)
    }

    /// Merge a partial computed from the current state and notify every
    /// listener.
    pub fn update<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&S) -> S::Partial,
    {
        self.upgrade()?.apply(f);
        Ok(())
    }

    /// A full handle to the store, if it is alive.
    pub fn store(&self) -> Result<Store<S>, StoreError> {
        self.upgrade().map(Store::from_shared)
    }
}

impl<S: State> Clone for SetState<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
            ready: Arc::clone(&self.ready),
        }
    }
}

impl<S: State> fmt::Debug for SetState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetState")
            .field("ready", &self.ready.load(Ordering::Acquire))
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}
