//! Binding Implementation
//!
//! A Binding connects a UI component to a derived slice of a store's state.
//!
//! # How Bindings Work
//!
//! 1. On creation, the selector runs once and its result is cached.
//!
//! 2. The binding subscribes to the store. After every update the selector
//!    runs again against the new state.
//!
//! 3. If the new value equals the cached one nothing happens. Otherwise the
//!    cache is replaced, the version is bumped and `on_change` (the host's
//!    re-render trigger) is called.
//!
//! 4. Dropping the binding unsubscribes it, mirroring component teardown.
//!
//! # Change Detection
//!
//! The comparison baseline is the binding's own cache. Reading the state,
//! selecting, comparing and replacing the cache all happen under one lock,
//! so back-to-back updates between two renders are compared against the
//! latest cached value, and rounds delivered on different threads cannot
//! leave an older selection in the cache.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::listener::{ListenerId, Unsubscribe};
use super::store::Shared;
use crate::state::State;

/// Cached derived value shared between a binding and its listener.
struct Cached<T> {
    value: Mutex<T>,
    version: AtomicU64,
}

/// A reactive binding to a derived value of a store.
///
/// # Type Parameters
///
/// - `T`: The selected value.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use corral_core::Store;
///
/// let store = Store::create(|_| HashMap::from([("count", 0), ("other", 0)]));
/// let count = store.bind(|s| s["count"], || println!("re-render"));
///
/// store.set_state(HashMap::from([("other", 1)]));
/// assert_eq!(count.version(), 0);
///
/// store.set_state(HashMap::from([("count", 1)]));
/// assert_eq!(count.get(), 1);
/// assert_eq!(count.version(), 1);
/// ```
pub struct Binding<T> {
    cell: Arc<Cached<T>>,
    subscription: Unsubscribe,
}

impl<T> Binding<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn attach<S, Sel, E, C>(
        shared: &Arc<Shared<S>>,
        selector: Sel,
        eq: E,
        on_change: C,
    ) -> Self
    where
        S: State,
        Sel: Fn(&S) -> T + Send + Sync + 'static,
        E: Fn(&T, &T) -> bool + Send + Sync + 'static,
        C: Fn() + Send + Sync + 'static,
    {
        let cell = Arc::new(Cached {
            value: Mutex::new(selector(&shared.snapshot())),
            version: AtomicU64::new(0),
        });

        let weak = Arc::downgrade(shared);
        let listener_cell = Arc::clone(&cell);
        let subscription = shared.subscribe(Box::new(move || {
            let Some(shared) = weak.upgrade() else {
                return;
            };

            let changed = {
                // Select under the cache lock so concurrent rounds settle on
                // the newest state.
                let mut cached = listener_cell.value.lock();
                let next = selector(&shared.snapshot());
                if eq(&cached, &next) {
                    false
                } else {
                    *cached = next;
                    true
                }
            };

            if changed {
                let version = listener_cell.version.fetch_add(1, Ordering::AcqRel) + 1;
                trace!(store = %shared.name(), version, "bound value changed");
                on_change();
            }
        }));

        Self { cell, subscription }
    }
}

impl<T> Binding<T> {
    /// Run `f` against the cached value without cloning it.
    ///
    /// The binding's lock is held while `f` runs; updating the same store
    /// from inside `f` deadlocks.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.cell.value.lock())
    }

    /// Number of times the cached value has changed since binding.
    pub fn version(&self) -> u64 {
        self.cell.version.load(Ordering::Acquire)
    }

    /// The listener registration backing this binding.
    pub fn listener_id(&self) -> ListenerId {
        self.subscription.id()
    }

    /// Whether the binding still receives updates.
    pub fn is_bound(&self) -> bool {
        self.subscription.is_active()
    }

    /// Stop tracking the store. The cached value stays readable.
    ///
    /// Returns `false` if the binding was already unbound.
    pub fn unbind(&self) -> bool {
        self.subscription.unsubscribe()
    }
}

impl<T: Clone> Binding<T> {
    /// Get the cached value.
    pub fn get(&self) -> T {
        self.cell.value.lock().clone()
    }
}

impl<T> Drop for Binding<T> {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}

impl<T: fmt::Debug> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("value", &*self.cell.value.lock())
            .field("version", &self.version())
            .field("bound", &self.is_bound())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    use crate::Store;

    crate::state! {
        #[derive(Clone, Debug)]
        struct Cart => CartPatch {
            items: Vec<String>,
            coupon: Option<String>,
        }
    }

    fn cart_store() -> Store<Cart> {
        Store::create(|_| Cart {
            items: Vec::new(),
            coupon: None,
        })
    }

    fn renders() -> (Arc<AtomicI32>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicI32::new(0));
        let count_clone = count.clone();
        (count, move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn binding_computes_on_creation() {
        let store = cart_store();
        let (render_count, rerender) = renders();

        let binding = store.bind(|s| s.items.len(), rerender);

        assert_eq!(binding.get(), 0);
        assert_eq!(binding.version(), 0);
        assert_eq!(render_count.load(Ordering::SeqCst), 0);
        assert!(binding.is_bound());
    }

    #[test]
    fn binding_rerenders_only_on_change() {
        let store = cart_store();
        let (render_count, rerender) = renders();
        let binding = store.bind(|s| s.items.len(), rerender);

        store.set_state(CartPatch {
            coupon: Some(Some("SPRING".to_string())),
            ..Default::default()
        });
        assert_eq!(render_count.load(Ordering::SeqCst), 0);

        store.update_state(|s| {
            let mut items = s.items.clone();
            items.push("tea".to_string());
            CartPatch {
                items: Some(items),
                ..Default::default()
            }
        });
        assert_eq!(render_count.load(Ordering::SeqCst), 1);
        assert_eq!(binding.get(), 1);
        assert_eq!(binding.version(), 1);

        // Same length, different contents.
        store.set_state(CartPatch {
            items: Some(vec!["coffee".to_string()]),
            ..Default::default()
        });
        assert_eq!(render_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn binding_with_custom_equality() {
        let store = cart_store();
        let (render_count, rerender) = renders();

        let binding = store.bind_by(
            |s| s.coupon.clone(),
            |a, b| a.as_deref().map(str::to_lowercase) == b.as_deref().map(str::to_lowercase),
            rerender,
        );

        store.set_state(CartPatch {
            coupon: Some(Some("save".to_string())),
            ..Default::default()
        });
        store.set_state(CartPatch {
            coupon: Some(Some("SAVE".to_string())),
            ..Default::default()
        });

        assert_eq!(render_count.load(Ordering::SeqCst), 1);
        binding.with(|coupon| assert_eq!(coupon.as_deref(), Some("save")));
    }

    #[test]
    fn binding_unsubscribes_on_drop() {
        let store = cart_store();
        let (render_count, rerender) = renders();

        let binding = store.bind(|s| s.items.clone(), rerender);
        assert_eq!(store.listener_count(), 1);

        drop(binding);
        assert_eq!(store.listener_count(), 0);

        store.set_state(CartPatch {
            items: Some(vec!["milk".to_string()]),
            ..Default::default()
        });
        assert_eq!(render_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unbound_binding_keeps_last_value() {
        let store = cart_store();
        let (_render_count, rerender) = renders();
        let binding = store.bind(|s| s.items.len(), rerender);

        store.set_state(CartPatch {
            items: Some(vec!["a".to_string()]),
            ..Default::default()
        });
        assert!(binding.unbind());
        assert!(!binding.unbind());

        store.set_state(CartPatch {
            items: Some(Vec::new()),
            ..Default::default()
        });
        assert_eq!(binding.get(), 1);
        assert!(!binding.is_bound());
    }

    #[test]
    fn binding_settles_on_latest_state_across_threads() {
        let store = cart_store();
        let (_render_count, rerender) = renders();
        let binding = store.bind(|s| s.items.len(), rerender);

        let writers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        store.update_state(|s| {
                            let mut items = s.items.clone();
                            items.push("x".to_string());
                            CartPatch {
                                items: Some(items),
                                ..Default::default()
                            }
                        });
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(binding.get(), store.get_state().items.len());
    }

    #[test]
    fn on_change_can_read_binding_state() {
        let store = cart_store();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let reader = store.clone();
        let seen_clone = seen.clone();
        let _binding = store.bind(
            |s| s.items.len(),
            move || seen_clone.lock().push(reader.get_state().items.len()),
        );

        store.set_state(CartPatch {
            items: Some(vec!["x".to_string(), "y".to_string()]),
            ..Default::default()
        });

        assert_eq!(*seen.lock(), vec![2]);
    }
}
