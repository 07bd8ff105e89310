//! Cached-state binding between a view controller and the session store.
//!
//! A [`CachedState`] pairs a session key with the factory that builds the
//! initial entry. The first [`CachedState::get_cached`] creates the entry;
//! later calls, including those from a remounted controller holding the same
//! key, see the same state.
//!
//! Merging state here does not schedule any re-render. Callers signal that
//! separately; the binding only persists state across mount cycles.

use super::store::{CacheEntry, SessionKey, SessionStore};
use std::fmt;

/// Shallow merge of a partial update into stored state.
///
/// Fields present in the patch overwrite the stored ones; absent fields are
/// left untouched.
pub trait Merge {
    /// Partial form of the state.
    type Patch;

    fn merge(&mut self, patch: Self::Patch);
}

/// Lazily created, key-addressed state shared across controller mounts.
///
/// # Examples
///
/// ```
/// use modeler_session::cache::{CacheEntry, CachedState, Merge, SessionStore};
///
/// #[derive(Default)]
/// struct Counter { value: u32 }
///
/// impl Merge for Counter {
///     type Patch = u32;
///     fn merge(&mut self, patch: u32) { self.value = patch; }
/// }
///
/// let mut store = SessionStore::new();
/// let binding = CachedState::new("tab-1", || CacheEntry::new(Counter::default()));
///
/// binding.set_cached(&mut store, 3);
/// assert_eq!(binding.get_cached(&mut store).value, 3);
/// ```
pub struct CachedState<T> {
    key: SessionKey,
    factory: Box<dyn Fn() -> CacheEntry<T>>,
}

impl<T> CachedState<T> {
    pub fn new(
        key: impl Into<SessionKey>,
        factory: impl Fn() -> CacheEntry<T> + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            factory: Box::new(factory),
        }
    }

    pub const fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Returns the session state, creating it on first access.
    pub fn get_cached<'s>(&self, store: &'s mut SessionStore<T>) -> &'s mut T {
        store.get_or_insert_with(&self.key, || (self.factory)())
    }

    /// Returns the session state without creating it.
    #[must_use]
    pub fn peek<'s>(&self, store: &'s SessionStore<T>) -> Option<&'s T> {
        store.get(self.key.as_str())
    }

    /// Merges `patch` into the stored state, creating it first if needed.
    pub fn set_cached(&self, store: &mut SessionStore<T>, patch: T::Patch)
    where
        T: Merge,
    {
        self.get_cached(store).merge(patch);
    }

    /// Retires the session key, tearing its entry down.
    ///
    /// Safe to call repeatedly and from several controllers sharing the key;
    /// only the first call finds an entry to tear down.
    pub fn destroy(&self, store: &mut SessionStore<T>) -> bool {
        store.destroy(self.key.as_str())
    }
}

impl<T> fmt::Debug for CachedState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedState")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
