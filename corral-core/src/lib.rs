//! Corral Core
//!
//! This crate provides an observable state store for reactive UI code.
//! It implements:
//!
//! - A state container updated through shallow partial merges
//! - Zero-argument change listeners with explicit unsubscribe handles
//! - Selector bindings that memoize a derived value and fire a re-render
//!   callback only when that value changes
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `state`: The [`State`] merge trait, map implementations and the
//!   [`state!`] macro for typed records
//! - `store`: The store itself, its setter handle, the listener registry
//!   and reactive bindings
//! - `config`: Per-store configuration
//! - `error`: Errors reported by the setter handle
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use corral_core::{state, SetState, Store, StoreError};
//!
//! state! {
//!     #[derive(Clone)]
//!     pub struct Counter => CounterPatch {
//!         pub count: i64,
//!         pub inc: Arc<dyn Fn() -> Result<(), StoreError> + Send + Sync>,
//!     }
//! }
//!
//! let store = Store::create(|set: SetState<Counter>| Counter {
//!     count: 0,
//!     inc: Arc::new(move || {
//!         set.update(|s| CounterPatch {
//!             count: Some(s.count + 1),
//!             ..Default::default()
//!         })
//!     }),
//! });
//!
//! (store.get_state().inc)()?;
//! (store.get_state().inc)()?;
//! assert_eq!(store.get_state().count, 2);
//! # Ok::<(), StoreError>(())
//! ```

pub mod config;
pub mod error;
pub mod state;
pub mod store;

pub use config::StoreConfig;
pub use error::StoreError;
pub use state::State;
pub use store::{Binding, ListenerId, SetState, Store, Unsubscribe};
