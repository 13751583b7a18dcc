//! Store configuration.

use std::borrow::Cow;

/// Name used when none is configured.
pub const DEFAULT_STORE_NAME: &str = "store";

/// Configuration for a single store instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Label attached to every log event and to the store's `Debug` output.
    pub name: Cow<'static, str>,
}

impl StoreConfig {
    /// Configuration with the given store name.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: Cow::Borrowed(DEFAULT_STORE_NAME),
        }
    }
}
