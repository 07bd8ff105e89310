//! Keyed session store.
//!
//! The store owns long-lived session state (engine instances and derived data)
//! addressed by a stable [`SessionKey`]. View controllers hold only the key, so
//! they can be torn down and recreated without losing the session.
//!
//! # Lifecycle
//!
//! Entries are never recreated implicitly. An entry lives until it is
//! explicitly destroyed, replaced with [`SessionStore::set`], or the store
//! itself is dropped. In every case its teardown runs exactly once.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

/// Stable identifier of one open document's session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SessionKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for SessionKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Callback releasing the resources held by an entry's state.
pub type Teardown<T> = Box<dyn FnOnce(&mut T)>;

/// Stored session state plus its optional teardown.
///
/// The teardown runs when the entry is dropped, which the store does on
/// destroy, replacement, and its own drop.
pub struct CacheEntry<T> {
    state: T,
    teardown: Option<Teardown<T>>,
}

impl<T> CacheEntry<T> {
    /// Wraps state that needs no teardown.
    pub const fn new(state: T) -> Self {
        Self {
            state,
            teardown: None,
        }
    }

    /// Wraps state together with the callback that releases it.
    pub fn with_teardown(state: T, teardown: impl FnOnce(&mut T) + 'static) -> Self {
        Self {
            state,
            teardown: Some(Box::new(teardown)),
        }
    }

    pub const fn state(&self) -> &T {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut T {
        &mut self.state
    }
}

impl<T> Drop for CacheEntry<T> {
    fn drop(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown(&mut self.state);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for CacheEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("state", &self.state)
            .field("has_teardown", &self.teardown.is_some())
            .finish()
    }
}

/// Process-wide container of session entries.
///
/// # Examples
///
/// ```
/// use modeler_session::cache::{CacheEntry, SessionKey, SessionStore};
///
/// let mut store = SessionStore::new();
/// store.set(SessionKey::from("tab-1"), CacheEntry::new(42));
///
/// assert!(store.has("tab-1"));
/// assert_eq!(store.get("tab-1"), Some(&42));
///
/// assert!(store.destroy("tab-1"));
/// assert!(!store.destroy("tab-1"));
/// ```
pub struct SessionStore<T> {
    entries: HashMap<SessionKey, CacheEntry<T>>,
}

impl<T> Default for SessionStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SessionStore<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns the state stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key).map(CacheEntry::state)
    }

    /// Returns the state stored under `key` for mutation.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.entries.get_mut(key).map(CacheEntry::state_mut)
    }

    /// Stores an entry, tearing down any entry it replaces.
    pub fn set(&mut self, key: SessionKey, entry: CacheEntry<T>) {
        let _span = tracing::debug_span!("session_store_set", key = %key).entered();

        if self.entries.insert(key, entry).is_some() {
            tracing::debug!("replaced existing session entry");
        }
    }

    /// Returns `true` if an entry exists for `key`.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the state under `key`, creating it with `factory` if absent.
    ///
    /// The factory is only invoked when no entry exists.
    pub fn get_or_insert_with(
        &mut self,
        key: &SessionKey,
        factory: impl FnOnce() -> CacheEntry<T>,
    ) -> &mut T {
        self.entries
            .entry(key.clone())
            .or_insert_with(|| {
                tracing::debug!(key = %key, "creating session entry");
                factory()
            })
            .state_mut()
    }

    /// Tears down and removes the entry under `key`.
    ///
    /// Returns `false` when there was nothing to destroy.
    pub fn destroy(&mut self, key: &str) -> bool {
        let _span = tracing::debug_span!("session_store_destroy", key = %key).entered();

        match self.entries.remove(key) {
            Some(entry) => {
                drop(entry);
                tracing::debug!("session entry destroyed");
                true
            }
            None => {
                tracing::trace!("no session entry to destroy");
                false
            }
        }
    }

    /// Iterates over the keys of all live entries.
    pub fn keys(&self) -> impl Iterator<Item = &SessionKey> {
        self.entries.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> fmt::Debug for SessionStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
