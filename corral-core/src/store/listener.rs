//! Listener registrations.
//!
//! A listener is any zero-argument callback interested in state changes.
//! The store keeps each registration in an insertion-ordered registry and
//! hands the caller an [`Unsubscribe`] handle to remove it again.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use smallvec::SmallVec;

/// Unique identifier for a listener registration.
///
/// Subscribing the same closure twice produces two registrations with
/// distinct IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Generate a new unique listener ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across stores and threads.
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

pub(crate) type Callback = Box<dyn Fn() + Send + Sync>;

/// Listeners captured for one notification round.
///
/// Most stores have a handful of listeners, so the batch stays on the stack.
pub(crate) type Batch = SmallVec<[Arc<Registration>; 8]>;

/// A single listener registration.
pub(crate) struct Registration {
    id: ListenerId,
    active: AtomicBool,
    callback: Callback,
}

impl Registration {
    fn new(callback: Callback) -> Self {
        Self {
            id: ListenerId::next(),
            active: AtomicBool::new(true),
            callback,
        }
    }

    pub(crate) fn id(&self) -> ListenerId {
        self.id
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Run the callback unless the registration was removed in the meantime.
    pub(crate) fn invoke(&self) {
        if self.is_active() {
            (self.callback)();
        }
    }

    /// Mark the registration removed. Returns `false` if it already was.
    fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }
}

/// Insertion-ordered set of registrations owned by a store.
#[derive(Default)]
pub(crate) struct Registry {
    entries: IndexMap<ListenerId, Arc<Registration>>,
}

impl Registry {
    pub(crate) fn insert(&mut self, callback: Callback) -> Arc<Registration> {
        let registration = Arc::new(Registration::new(callback));
        self.entries
            .insert(registration.id(), Arc::clone(&registration));
        registration
    }

    /// Remove a registration, keeping the order of the remaining ones.
    pub(crate) fn remove(&mut self, id: ListenerId) -> Option<Arc<Registration>> {
        self.entries.shift_remove(&id)
    }

    /// Registrations in FIFO order, detached from the registry lock.
    pub(crate) fn batch(&self) -> Batch {
        self.entries.values().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// The side of a store that can drop a registration.
pub(crate) trait Detach: Send + Sync {
    fn detach(&self, id: ListenerId);
}

/// Handle returned by [`Store::subscribe`](crate::Store::subscribe).
///
/// Dropping the handle does NOT remove the listener; call
/// [`unsubscribe`](Unsubscribe::unsubscribe). Clones refer to the same
/// registration.
#[derive(Clone)]
pub struct Unsubscribe {
    registration: Arc<Registration>,
    owner: Weak<dyn Detach>,
}

impl Unsubscribe {
    pub(crate) fn new(registration: Arc<Registration>, owner: Weak<dyn Detach>) -> Self {
        Self {
            registration,
            owner,
        }
    }

    /// The ID of the registration this handle controls.
    pub fn id(&self) -> ListenerId {
        self.registration.id()
    }

    /// Remove the listener from its store.
    ///
    /// The listener receives no further notifications, including the rest
    /// of a notification round already in progress. Returns `true` on the
    /// first call and `false` on every later one.
    pub fn unsubscribe(&self) -> bool {
        if !self.registration.deactivate() {
            return false;
        }
        if let Some(owner) = self.owner.upgrade() {
            owner.detach(self.id());
        }
        true
    }

    /// Whether the listener is still registered.
    pub fn is_active(&self) -> bool {
        self.registration.is_active()
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("id", &self.id())
            .field("active", &self.is_active())
            .finish()
    }
}
