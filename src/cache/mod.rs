//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and LRU eviction.

use std::sync::{Mutex, MutexGuard, PoisonError};

mod engine;
mod entry;
mod lru;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use engine::Cache;
pub use entry::Entry;
pub use lru::{Handle, Iter, RecencyList};
pub use store::CacheStore;

/// Locks the shared store.
///
/// A poisoned lock is recovered. Store methods only run caller code through
/// `Hash`, `Eq`, `Clone` and `Drop`, which are expected not to panic.
pub(crate) fn lock_store<K, V>(store: &Mutex<CacheStore<K, V>>) -> MutexGuard<'_, CacheStore<K, V>> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}
