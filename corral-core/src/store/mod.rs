//! Observable Store
//!
//! This module implements the store and everything that observes it.
//!
//! # Concepts
//!
//! ## Store
//!
//! A [`Store`] holds one state value. It is read as an immutable snapshot
//! and changed only through partial updates, either a plain partial or one
//! computed from the previous state. Every update notifies all listeners,
//! even when nothing actually changed.
//!
//! ## Listeners
//!
//! A listener is a zero-argument callback. Subscribing returns an
//! [`Unsubscribe`] handle; listeners are called in registration order.
//!
//! ## Bindings
//!
//! A [`Binding`] is a listener that also memoizes a selected slice of the
//! state and calls its `on_change` callback only when that slice changes.
//! This is the hook a UI layer uses to re-render a component.
//!
//! ## Setter
//!
//! The initializer of a store receives a [`SetState`] handle so that the
//! state can carry its own actions.
//!
//! # Implementation Notes
//!
//! Everything runs synchronously on the calling thread. No store lock is
//! held while user callbacks run, so callbacks may freely re-enter the
//! store. A panicking callback unwinds through the update that triggered it
//! and skips the remaining listeners of that round.

mod binding;
mod listener;
mod setter;
mod store;

pub use binding::Binding;
pub use listener::{ListenerId, Unsubscribe};
pub use setter::SetState;
pub use store::Store;
