//! Cache Engine Module
//!
//! Thread-safe cache front: one mutex around the store plus an owned reaper.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::info;

use crate::cache::{lock_store, CacheStore};
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::{Reaper, ReaperState};

// == Cache ==
/// Bounded key-value cache with LRU eviction and per-entry TTL.
///
/// All operations are synchronous and take `&self`; share the cache between
/// threads or tasks with an `Arc`. Index and recency order are guarded by a
/// single lock, which the background reaper also takes for each sweep.
///
/// A Tokio runtime must be current when the cache is built, since the reaper
/// runs as a task on it.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use lru_ttl_cache::Cache;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> lru_ttl_cache::Result<()> {
/// let cache = Cache::new(2, Duration::from_secs(1))?;
/// cache.put("a", 1, Duration::from_secs(60));
/// cache.put("b", 2, Duration::from_secs(60));
/// cache.get(&"a");
/// cache.put("c", 3, Duration::from_secs(60));
///
/// assert_eq!(cache.get(&"b"), None);
/// assert_eq!(cache.get(&"a"), Some(1));
/// cache.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct Cache<K, V, C = SystemClock> {
    store: Arc<Mutex<CacheStore<K, V>>>,
    clock: C,
    default_ttl: Duration,
    /// Taken by the first `shutdown`; async lock so racing callers wait for it
    reaper: tokio::sync::Mutex<Option<Reaper>>,
    reaper_running: Arc<AtomicBool>,
}

impl<K, V> Cache<K, V, SystemClock>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    // == Constructor ==
    /// Creates a cache holding at most `capacity` entries, swept every
    /// `cleanup_interval`.
    ///
    /// # Errors
    /// - `CacheError::Config` if `capacity` or `cleanup_interval` is zero
    /// - `CacheError::Runtime` if no Tokio runtime is current
    pub fn new(capacity: usize, cleanup_interval: Duration) -> Result<Self> {
        Self::from_config(&CacheConfig::new(capacity, cleanup_interval))
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<K, V, C> Cache<K, V, C>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Clone + Send + 'static,
    C: Clock + Clone,
{
    /// Creates a cache reading time from `clock` (useful for testing).
    pub fn with_clock(config: &CacheConfig, clock: C) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|err| CacheError::Runtime(err.to_string()))?;

        let store = Arc::new(Mutex::new(CacheStore::new(config.capacity)));
        let reaper = Reaper::spawn(&runtime, store.clone(), clock.clone(), config.cleanup_interval);
        let reaper_running = reaper.running_flag();

        info!(
            capacity = config.capacity,
            cleanup_interval_ms = u64::try_from(config.cleanup_interval.as_millis()).unwrap_or(u64::MAX),
            "cache initialized"
        );

        Ok(Self {
            store,
            clock,
            default_ttl: config.default_ttl,
            reaper: tokio::sync::Mutex::new(Some(reaper)),
            reaper_running,
        })
    }

    // == Put ==
    /// Stores `value` under `key`, expiring after `ttl`.
    ///
    /// Overwriting an existing key replaces its entry and TTL without using
    /// a new slot. Inserting a new key into a full cache evicts the least
    /// recently used entry first.
    pub fn put(&self, key: K, value: V, ttl: Duration) {
        let now = self.clock.now();
        let evicted = self.store().put(key, value, ttl, now);
        // Evicted values are dropped outside the lock
        drop(evicted);
    }

    /// Stores `value` under `key` with the configured default TTL.
    pub fn insert(&self, key: K, value: V) {
        self.put(key, value, self.default_ttl);
    }

    // == Get ==
    /// Returns a copy of the value under `key` and marks it most recently
    /// used.
    ///
    /// Missing and expired keys both return `None`; an expired entry is
    /// removed on the spot.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        self.store().get(key, now).cloned()
    }

    // == Remove ==
    /// Removes `key` if present, returning its value unless it had already
    /// expired. Removing an absent key is a no-op.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        let entry = self.store().remove(key)?;
        if entry.is_expired(now) {
            return None;
        }
        Some(entry.into_parts().1)
    }

    /// Checks whether `key` holds a live entry without changing its recency.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        self.store().contains_key(key, now)
    }

    /// Remaining lifetime of a live entry, `Duration::MAX` if it never
    /// expires.
    pub fn ttl_remaining<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        self.store().ttl_remaining(key, now)
    }

    // == Size ==
    /// Number of tracked entries, counting expired ones not yet swept.
    pub fn size(&self) -> usize {
        self.store().len()
    }

    pub fn len(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.store().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.store().capacity()
    }

    /// Runs a sweep now, independent of the reaper schedule.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        self.store().purge_expired(now)
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.store().clear();
    }

    pub fn reaper_state(&self) -> ReaperState {
        if self.reaper_running.load(Ordering::Acquire) {
            ReaperState::Running
        } else {
            ReaperState::Stopped
        }
    }

    // == Shutdown ==
    /// Stops the background reaper and waits for it to exit.
    ///
    /// Idempotent. Entries stay readable afterwards and lazy expiry on `get`
    /// still applies; only proactive sweeping ends.
    pub async fn shutdown(&self) {
        let mut slot = self.reaper.lock().await;
        if let Some(reaper) = slot.take() {
            reaper.stop().await;
            info!("cache reaper shut down");
        }
    }

    fn store(&self) -> MutexGuard<'_, CacheStore<K, V>> {
        lock_store(&self.store)
    }

    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        self.store().is_consistent()
    }
}

impl<K, V, C> fmt::Debug for Cache<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let running = self.reaper_running.load(Ordering::Acquire);
        f.debug_struct("Cache")
            .field("default_ttl", &self.default_ttl)
            .field("reaper_running", &running)
            .finish_non_exhaustive()
    }
}
