//! State and Partial Updates
//!
//! A store holds a single state value and changes it only by merging a
//! *partial update* onto it. The merge is shallow: every field (or key)
//! present in the partial overwrites the current one, everything else is
//! preserved. Applying partials `P1..Pn` to an initial state `S0` therefore
//! always yields the left fold `S0.merge(P1)...merge(Pn)`.
//!
//! # Typed Records
//!
//! For a record type the partial is a companion struct whose fields are all
//! `Option`s. The [`state!`](crate::state!) macro generates both structs and
//! the merge in one go:
//!
//! ```rust
//! use corral_core::{state, State};
//!
//! state! {
//!     #[derive(Clone, Debug, PartialEq)]
//!     pub struct Profile => ProfilePatch {
//!         pub name: String,
//!         pub age: u32,
//!     }
//! }
//!
//! let profile = Profile { name: "ada".into(), age: 36 }.merged(ProfilePatch {
//!     age: Some(37),
//!     ..Default::default()
//! });
//! assert_eq!(profile, Profile { name: "ada".into(), age: 37 });
//! ```
//!
//! # Keyed Maps
//!
//! `HashMap`, `BTreeMap` and `IndexMap` are states whose partial is another
//! map of the same type. Keys of the partial overwrite existing keys.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use indexmap::IndexMap;

/// A value that can be held by a [`Store`](crate::Store).
///
/// Implementors define what a partial update looks like and how it is
/// shallow-merged onto the current value.
pub trait State: Clone + Send + Sync + 'static {
    /// The shape of a partial update.
    type Partial;

    /// Overwrite the fields present in `partial`, keeping all others.
    fn merge(&mut self, partial: Self::Partial);

    /// Consuming form of [`merge`](State::merge).
    fn merged(mut self, partial: Self::Partial) -> Self {
        self.merge(partial);
        self
    }
}

impl<K, V, H> State for HashMap<K, V, H>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    H: BuildHasher + Clone + Send + Sync + 'static,
{
    type Partial = Self;

    fn merge(&mut self, partial: Self) {
        self.extend(partial);
    }
}

impl<K, V> State for BTreeMap<K, V>
where
    K: Ord + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    type Partial = Self;

    fn merge(&mut self, partial: Self) {
        self.extend(partial);
    }
}

impl<K, V, H> State for IndexMap<K, V, H>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    H: BuildHasher + Clone + Send + Sync + 'static,
{
    type Partial = Self;

    // New keys are appended; existing keys keep their position.
    fn merge(&mut self, partial: Self) {
        self.extend(partial);
    }
}

/// Declare a record state together with its partial-update struct.
///
/// ```rust
/// use corral_core::state;
///
/// state! {
///     #[derive(Clone, Debug)]
///     pub struct Filters => FiltersPatch {
///         pub query: String,
///         pub limit: usize,
///     }
/// }
///
/// let patch = FiltersPatch { limit: Some(10), ..Default::default() };
/// assert!(patch.query.is_none());
/// ```
///
/// The partial struct has the same field names and visibilities, each
/// wrapped in `Option`, and implements `Default` (all `None`) and `Clone`.
/// The record must be `Clone + Send + Sync + 'static`; derive `Clone` via the
/// attributes passed to the macro.
#[macro_export]
macro_rules! state {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident => $partial:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        #[doc = concat!("Partial update for [`", stringify!($name), "`].")]
        #[derive(Clone, Default)]
        $vis struct $partial {
            $(
                $field_vis $field: ::core::option::Option<$ty>,
            )*
        }

        impl $crate::State for $name {
            type Partial = $partial;

            fn merge(&mut self, partial: $partial) {
                $(
                    if let ::core::option::Option::Some(value) = partial.$field {
                        self.$field = value;
                    }
                )*
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::state! {
        #[derive(Clone, Debug, PartialEq)]
        struct Settings => SettingsPatch {
            theme: String,
            volume: u8,
            muted: bool,
        }
    }

    fn settings() -> Settings {
        Settings {
            theme: "dark".to_string(),
            volume: 5,
            muted: false,
        }
    }

    #[test]
    fn record_merge_overwrites_present_fields_only() {
        let mut state = settings();
        state.merge(SettingsPatch {
            volume: Some(9),
            ..Default::default()
        });

        assert_eq!(state.volume, 9);
        assert_eq!(state.theme, "dark");
        assert!(!state.muted);
    }

    #[test]
    fn record_empty_partial_is_identity() {
        assert_eq!(settings().merged(SettingsPatch::default()), settings());
    }

    #[test]
    fn record_later_partial_wins() {
        let state = settings()
            .merged(SettingsPatch {
                theme: Some("light".to_string()),
                volume: Some(1),
                ..Default::default()
            })
            .merged(SettingsPatch {
                volume: Some(2),
                muted: Some(true),
                ..Default::default()
            });

        assert_eq!(
            state,
            Settings {
                theme: "light".to_string(),
                volume: 2,
                muted: true,
            }
        );
    }

    #[test]
    fn hash_map_merge_is_shallow() {
        let mut state: HashMap<String, i32> =
            [("a".to_string(), 1), ("b".to_string(), 2)].into_iter().collect();
        state.merge(
            [("b".to_string(), 20), ("c".to_string(), 30)]
                .into_iter()
                .collect(),
        );

        assert_eq!(state.len(), 3);
        assert_eq!(state["a"], 1);
        assert_eq!(state["b"], 20);
        assert_eq!(state["c"], 30);
    }

    #[test]
    fn btree_map_merge_is_shallow() {
        let state: BTreeMap<&'static str, Vec<u8>> = [("x", vec![1, 2])].into_iter().collect();
        let state = state.merged([("x", vec![]), ("y", vec![3])].into_iter().collect());

        assert_eq!(state["x"], Vec::<u8>::new());
        assert_eq!(state["y"], vec![3]);
    }

    #[test]
    fn index_map_merge_keeps_key_positions() {
        let mut state: IndexMap<&'static str, i32> =
            [("first", 1), ("second", 2)].into_iter().collect();
        state.merge([("third", 3), ("first", 10)].into_iter().collect());

        let keys: Vec<_> = state.keys().copied().collect();
        assert_eq!(keys, vec!["first", "second", "third"]);
        assert_eq!(state["first"], 10);
    }
}
