//! Session cache surviving view-controller remounts.
//!
//! # Modules
//!
//! - [`store`]: Keyed store owning session entries and their teardown
//! - [`binding`]: Lazy, key-addressed access to one entry with shallow merges

pub mod binding;
pub mod store;

pub use binding::{CachedState, Merge};
pub use store::{CacheEntry, SessionKey, SessionStore, Teardown};
