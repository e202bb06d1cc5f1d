//! Cache Entry Module
//!
//! Defines the immutable holder for a key, its value and its expiry.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// A single cache entry.
///
/// Entries are never mutated; refreshing a value or TTL builds a new one.
#[derive(Debug)]
pub struct Entry<K, V> {
    key: K,
    value: V,
    /// Absolute expiry instant, None = the TTL ran past the end of time
    expires_at: Option<Instant>,
}

impl<K, V> Entry<K, V> {
    // == Constructor ==
    /// Creates an entry that expires `ttl` after `now`.
    pub fn new(key: K, value: V, ttl: Duration, now: Instant) -> Self {
        Self {
            key,
            value,
            expires_at: now.checked_add(ttl),
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`, as seen by reads.
    ///
    /// Boundary condition: an entry is still readable at its exact expiry
    /// instant and expired strictly after it, so a zero TTL entry can be read
    /// back at the instant it was stored.
    pub fn is_expired(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now > expires,
            None => false,
        }
    }

    // == Is Reapable ==
    /// Checks if a sweep at `now` should drop the entry.
    ///
    /// Sweeps take entries from their expiry instant onwards, while reads
    /// keep them until strictly after it.
    pub fn is_reapable(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => expires <= now,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining TTL at `now`.
    ///
    /// # Returns
    /// - `Duration::ZERO` if the entry has expired
    /// - `Duration::MAX` if the entry never expires
    pub fn ttl_remaining(&self, now: Instant) -> Duration {
        match self.expires_at {
            Some(expires) => expires.saturating_duration_since(now),
            None => Duration::MAX,
        }
    }

    /// Consumes the entry, yielding its key and value.
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}
