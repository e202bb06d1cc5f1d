//! Cache Store Module
//!
//! Single-threaded cache core pairing a HashMap index with the recency list.
//! `Cache` wraps it in a mutex; every method here runs as one critical section.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::cache::{Entry, Handle, RecencyList};

// == Cache Store ==
/// Cache storage with LRU eviction and TTL support.
///
/// Time is passed in by the caller so the store never reads a clock itself.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    /// Key to position in `recency`
    index: HashMap<K, Handle>,
    /// Entries ordered by access time
    recency: RecencyList<K, V>,
    /// Maximum number of entries allowed
    capacity: usize,
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a new store holding at most `capacity` entries.
    ///
    /// # Panics
    /// Panics if `capacity` is 0. `Cache` rejects that through
    /// `CacheConfig::validate` before a store is built.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "CacheStore capacity must be > 0");
        Self {
            index: HashMap::with_capacity(capacity),
            recency: RecencyList::with_capacity(capacity),
            capacity,
        }
    }

    // == Put ==
    /// Stores a key-value pair expiring `ttl` after `now`.
    ///
    /// If the key already exists, its entry is replaced and becomes the most
    /// recently used one without consuming a new slot. Otherwise, if the
    /// store is full, the least recently used entry is evicted first.
    ///
    /// Returns the evicted entry, if any.
    pub fn put(&mut self, key: K, value: V, ttl: Duration, now: Instant) -> Option<Entry<K, V>> {
        if let Some(&handle) = self.index.get(&key) {
            self.recency
                .replace(handle, Entry::new(key, value, ttl, now));
            self.recency.move_to_front(handle);
            return None;
        }

        let evicted = if self.index.len() >= self.capacity {
            self.evict_lru()
        } else {
            None
        };

        let handle = self
            .recency
            .push_front(Entry::new(key.clone(), value, ttl, now));
        self.index.insert(key, handle);
        evicted
    }

    // == Get ==
    /// Retrieves a value by key, promoting it to most recently used.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get<Q>(&mut self, key: &Q, now: Instant) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.live_handle(key, now)?;
        self.recency.move_to_front(handle);
        self.recency.get(handle).map(Entry::value)
    }

    // == Remove ==
    /// Removes an entry by key. Absent keys are ignored.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.index.remove(key)?;
        self.recency.remove(handle)
    }

    // == Contains ==
    /// Checks whether `key` holds a live entry, without promoting it.
    pub fn contains_key<Q>(&self, key: &Q, now: Instant) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.peek_entry(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    // == Time To Live ==
    /// Returns the remaining TTL of a live entry, without promoting it.
    pub fn ttl_remaining<Q>(&self, key: &Q, now: Instant) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.peek_entry(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.ttl_remaining(now))
    }

    // == Purge Expired ==
    /// Removes all entries whose expiry instant is at or before `now`.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<Handle> = self
            .recency
            .iter()
            .filter(|(_, entry)| entry.is_reapable(now))
            .map(|(handle, _)| handle)
            .collect();

        for &handle in &expired {
            if let Some(entry) = self.recency.remove(handle) {
                self.index.remove(entry.key());
            }
        }

        expired.len()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.index.clear();
        self.recency.clear();
    }

    /// Iterates keys from most to least recently used, expired ones included.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.recency.iter().map(|(_, entry)| entry.key())
    }

    // == Length ==
    /// Returns the number of tracked entries, including unswept expired ones.
    pub fn len(&self) -> usize {
        self.recency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recency.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Checks that index and recency list describe the same set of entries.
    pub fn is_consistent(&self) -> bool {
        if self.index.len() != self.recency.len() {
            return false;
        }
        let indexed = self.index.iter().all(|(key, &handle)| {
            self.recency
                .get(handle)
                .is_some_and(|entry| entry.key() == key)
        });
        let mut walked = 0;
        let listed = self.recency.iter().all(|(handle, entry)| {
            walked += 1;
            self.index.get(entry.key()) == Some(&handle)
        });
        indexed && listed && walked == self.recency.len()
    }

    fn evict_lru(&mut self) -> Option<Entry<K, V>> {
        let entry = self.recency.pop_back()?;
        self.index.remove(entry.key());
        debug!(capacity = self.capacity, "evicted least recently used entry");
        Some(entry)
    }

    fn peek_entry<Q>(&self, key: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let &handle = self.index.get(key)?;
        self.recency.get(handle)
    }

    /// Looks up `key`, dropping it on the spot if it has expired.
    fn live_handle<Q>(&mut self, key: &Q, now: Instant) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let &handle = self.index.get(key)?;
        let expired = self
            .recency
            .get(handle)
            .map_or(true, |entry| entry.is_expired(now));
        if expired {
            self.index.remove(key);
            self.recency.remove(handle);
            return None;
        }
        Some(handle)
    }
}
