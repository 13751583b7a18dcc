//! Store Implementation
//!
//! A store owns one state value and the listeners interested in it.
//!
//! # How Updates Work
//!
//! 1. The partial update is resolved. The functional form is evaluated
//!    against the current snapshot with no lock held.
//!
//! 2. The partial is merged onto the state current at assignment time and
//!    the result replaces the state.
//!
//! 3. Every registered listener is called synchronously, in registration
//!    order, on the calling thread.
//!
//! # Thread Safety
//!
//! State and registry sit behind `parking_lot` locks that are released
//! before any user callback runs. Listeners may therefore read, update,
//! subscribe and unsubscribe from inside a notification.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::binding::Binding;
use super::listener::{Callback, Detach, ListenerId, Registry, Unsubscribe};
use super::setter::SetState;
use crate::config::StoreConfig;
use crate::state::State;

/// State shared by every handle to one store.
pub(crate) struct Shared<S: State> {
    config: StoreConfig,
    state: RwLock<Arc<S>>,
    listeners: RwLock<Registry>,
}

impl<S: State> Shared<S> {
    pub(crate) fn name(&self) -> &str {
        &self.config.name
    }

    pub(crate) fn snapshot(&self) -> Arc<S> {
        self.state.read().clone()
    }

    /// Resolve a partial update, merge it and notify.
    pub(crate) fn apply<F>(&self, resolve: F)
    where
        F: FnOnce(&S) -> S::Partial,
    {
        let partial = {
            let current = self.snapshot();
            resolve(&current)
        };

        {
            let mut state = self.state.write();
            // Snapshots still held by callers keep the old value.
            Arc::make_mut(&mut *state).merge(partial);
        }
        trace!(store = %self.name(), "state replaced");

        self.notify();
    }

    fn notify(&self) {
        let batch = self.listeners.read().batch();
        trace!(store = %self.name(), listeners = batch.len(), "notifying listeners");

        for registration in batch {
            registration.invoke();
        }
    }

    pub(crate) fn subscribe(self: &Arc<Self>, callback: Callback) -> Unsubscribe {
        let registration = self.listeners.write().insert(callback);
        debug!(
            store = %self.name(),
            listener = registration.id().raw(),
            "listener subscribed"
        );

        let owner: Weak<Self> = Arc::downgrade(self);
        let owner: Weak<dyn Detach> = owner;
        Unsubscribe::new(registration, owner)
    }

    fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl<S: State> Detach for Shared<S> {
    fn detach(&self, id: ListenerId) {
        if self.listeners.write().remove(id).is_some() {
            debug!(store = %self.name(), listener = id.raw(), "listener unsubscribed");
        }
    }
}

/// An observable state container.
///
/// # Type Parameters
///
/// - `S`: The state type. See [`State`] for how partial updates merge.
///
/// Cloning a store yields another handle to the same instance.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use corral_core::Store;
///
/// let store = Store::create(|_set| HashMap::from([("count", 0)]));
///
/// let unsubscribe = store.subscribe(|| println!("changed"));
/// store.update_state(|s| HashMap::from([("count", s["count"] + 1)]));
/// unsubscribe.unsubscribe();
///
/// assert_eq!(store.get_state()["count"], 1);
/// ```
pub struct Store<S: State> {
    shared: Arc<Shared<S>>,
}

impl<S: State> Store<S> {
    /// Create a store with the default configuration.
    ///
    /// `init` runs exactly once, before this returns. It receives a
    /// [`SetState`] handle that may be kept inside the state, e.g. in action
    /// closures, and returns the initial state.
    pub fn create<F>(init: F) -> Self
    where
        F: FnOnce(SetState<S>) -> S,
    {
        Self::create_with(StoreConfig::default(), init)
    }

    /// Create a store with an explicit configuration.
    pub fn create_with<F>(config: StoreConfig, init: F) -> Self
    where
        F: FnOnce(SetState<S>) -> S,
    {
        let ready = Arc::new(AtomicBool::new(false));

        let shared = Arc::new_cyclic(|weak| {
            let initial = init(SetState::new(weak.clone(), Arc::clone(&ready)));
            Shared {
                config,
                state: RwLock::new(Arc::new(initial)),
                listeners: RwLock::new(Registry::default()),
            }
        });
        ready.store(true, Ordering::Release);

        debug!(store = %shared.name(), "store created");
        Self { shared }
    }

    /// The configured store name.
    pub fn name(&self) -> &str {
        self.shared.name()
    }

    /// Get the current state.
    ///
    /// The returned snapshot never changes; later updates replace the
    /// store's state instead of mutating it.
    pub fn get_state(&self) -> Arc<S> {
        self.shared.snapshot()
    }

    /// Merge a partial update onto the state and notify every listener.
    ///
    /// An empty partial leaves the state as it is but still notifies.
    pub fn set_state(&self, partial: S::Partial) {
        self.shared.apply(move |_| partial);
    }

    /// Merge a partial computed from the current state and notify every
    /// listener.
    ///
    /// `f` runs with no lock held. If it updates the store itself, the
    /// returned partial is merged on top of that update.
    pub fn update_state<F>(&self, f: F)
    where
        F: FnOnce(&S) -> S::Partial,
    {
        self.shared.apply(f);
    }

    /// Register a listener called after every update.
    ///
    /// The listener stays registered until the returned handle's
    /// [`unsubscribe`](Unsubscribe::unsubscribe) is called.
    pub fn subscribe<F>(&self, listener: F) -> Unsubscribe
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.shared.subscribe(Box::new(listener))
    }

    /// Bind to a derived value, re-rendering only when it changes.
    ///
    /// The selector runs now and after every update; `on_change` runs only
    /// when the selected value is not equal to the cached one.
    ///
    /// The selector runs while the binding's cache is locked, so it must not
    /// read the binding it is creating.
    pub fn bind<T, Sel, C>(&self, selector: Sel, on_change: C) -> Binding<T>
    where
        T: PartialEq + Send + Sync + 'static,
        Sel: Fn(&S) -> T + Send + Sync + 'static,
        C: Fn() + Send + Sync + 'static,
    {
        self.bind_by(selector, T::eq, on_change)
    }

    /// Like [`bind`](Store::bind) with a custom equality check.
    pub fn bind_by<T, Sel, E, C>(&self, selector: Sel, eq: E, on_change: C) -> Binding<T>
    where
        T: Send + Sync + 'static,
        Sel: Fn(&S) -> T + Send + Sync + 'static,
        E: Fn(&T, &T) -> bool + Send + Sync + 'static,
        C: Fn() + Send + Sync + 'static,
    {
        Binding::attach(&self.shared, selector, eq, on_change)
    }

    /// Number of live listener registrations, bindings included.
    pub fn listener_count(&self) -> usize {
        self.shared.listener_count()
    }

    pub(crate) fn from_shared(shared: Arc<Shared<S>>) -> Self {
        Self { shared }
    }
}

impl<S: State> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: State> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name())
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
