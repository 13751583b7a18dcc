//! Store errors.

/// Errors reported when a [`SetState`](crate::SetState) handle cannot reach
/// its store.
///
/// Store methods are infallible; only the detached setter handed to the
/// initializer can observe a store that is not (or no longer) there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The setter was called while the initializer was still building the
    /// initial state.
    #[error("store is still being initialized")]
    Uninitialized,

    /// Every handle to the store has been dropped.
    #[error("store has been dropped")]
    Dropped,
}
