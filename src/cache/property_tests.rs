//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check capacity, recency and consistency properties.

use proptest::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::{Cache, CacheStore};
use crate::config::CacheConfig;

// == Test Configuration ==
const TEST_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
/// Small key space so operations collide often
fn key_strategy() -> impl Strategy<Value = u8> {
    0u8..16
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: u8, value: u32 },
    Get { key: u8 },
    Remove { key: u8 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::Put { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Remove { key }),
    ]
}

/// Reference LRU: plain Vec, most recently used first.
#[derive(Default)]
struct ModelLru {
    entries: Vec<(u8, u32)>,
}

impl ModelLru {
    fn put(&mut self, key: u8, value: u32, capacity: usize) {
        if let Some(pos) = self.entries.iter().position(|(k, _)| *k == key) {
            self.entries.remove(pos);
        } else if self.entries.len() >= capacity {
            self.entries.pop();
        }
        self.entries.insert(0, (key, value));
    }

    fn get(&mut self, key: u8) -> Option<u32> {
        let pos = self.entries.iter().position(|(k, _)| *k == key)?;
        let entry = self.entries.remove(pos);
        self.entries.insert(0, entry);
        Some(entry.1)
    }

    fn remove(&mut self, key: u8) {
        self.entries.retain(|(k, _)| *k != key);
    }

    fn keys(&self) -> Vec<u8> {
        self.entries.iter().map(|(k, _)| *k).collect()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of puts, the store never holds more than its capacity.
    #[test]
    fn prop_capacity_enforcement(
        capacity in 1usize..20,
        keys in prop::collection::vec(any::<u16>(), 1..200)
    ) {
        let now = Instant::now();
        let mut store = CacheStore::new(capacity);

        for key in keys {
            store.put(key, key, TEST_TTL, now);
            prop_assert!(
                store.len() <= capacity,
                "Cache size {} exceeds max {}",
                store.len(),
                capacity
            );
        }
    }

    // For any operation sequence, hits, misses and recency order match a
    // naive reference LRU.
    #[test]
    fn prop_matches_reference_lru(
        capacity in 1usize..8,
        ops in prop::collection::vec(cache_op_strategy(), 1..100)
    ) {
        let now = Instant::now();
        let mut store = CacheStore::new(capacity);
        let mut model = ModelLru::default();

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    store.put(key, value, TEST_TTL, now);
                    model.put(key, value, capacity);
                }
                CacheOp::Get { key } => {
                    prop_assert_eq!(store.get(&key, now).copied(), model.get(key));
                }
                CacheOp::Remove { key } => {
                    store.remove(&key);
                    model.remove(key);
                }
            }

            prop_assert!(store.is_consistent());
            let order: Vec<u8> = store.keys().copied().collect();
            prop_assert_eq!(order, model.keys());
        }
    }

    // Overwriting a key returns the newest value and consumes no slot.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        value1 in any::<u32>(),
        value2 in any::<u32>()
    ) {
        let now = Instant::now();
        let mut store = CacheStore::new(4);

        store.put(key, value1, TEST_TTL, now);
        store.put(key, value2, TEST_TTL, now);

        prop_assert_eq!(store.get(&key, now).copied(), Some(value2));
        prop_assert_eq!(store.len(), 1);
    }

    // Removing an absent key changes nothing.
    #[test]
    fn prop_remove_absent_is_noop(
        present in prop::collection::hash_set(0u8..8, 0..8),
        absent in 8u8..16
    ) {
        let now = Instant::now();
        let mut store = CacheStore::new(16);
        for key in &present {
            store.put(*key, 0u32, TEST_TTL, now);
        }
        let before: Vec<u8> = store.keys().copied().collect();

        prop_assert!(store.remove(&absent).is_none());

        let after: Vec<u8> = store.keys().copied().collect();
        prop_assert_eq!(before, after);
    }

    // Reads see an entry up to and including its expiry instant; sweeps
    // take it from that instant on.
    #[test]
    fn prop_ttl_expiration_behavior(
        ttl_ms in 0u64..10_000,
        check_ms in 0u64..20_000
    ) {
        let now = Instant::now();
        let ttl = Duration::from_millis(ttl_ms);
        let check = now + Duration::from_millis(check_ms);

        let mut by_get = CacheStore::new(4);
        by_get.put(1u8, 1u32, ttl, now);
        prop_assert_eq!(by_get.get(&1, check).is_some(), check_ms <= ttl_ms);

        let mut by_sweep = CacheStore::new(4);
        by_sweep.put(1u8, 1u32, ttl, now);
        let removed = by_sweep.purge_expired(check);
        prop_assert_eq!(removed == 0, check_ms < ttl_ms);
        prop_assert!(by_sweep.is_consistent());
    }
}

// Concurrent runs spawn threads and a runtime, so fewer cases
proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    // Concurrent callers plus an active reaper never leave index and recency
    // list disagreeing on membership.
    #[test]
    fn prop_concurrent_consistency(
        capacity in 1usize..12,
        workloads in prop::collection::vec(
            prop::collection::vec((cache_op_strategy(), 0u64..4), 1..200),
            2..5
        )
    ) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        let config = CacheConfig::new(capacity, Duration::from_millis(1));
        let cache: Arc<Cache<u8, u32>> = {
            let _guard = runtime.enter();
            Arc::new(Cache::from_config(&config).unwrap())
        };

        thread::scope(|scope| {
            for workload in &workloads {
                let cache = Arc::clone(&cache);
                scope.spawn(move || {
                    for (op, ttl_ms) in workload {
                        match op {
                            CacheOp::Put { key, value } => {
                                cache.put(*key, *value, Duration::from_millis(*ttl_ms));
                            }
                            CacheOp::Get { key } => {
                                cache.get(key);
                            }
                            CacheOp::Remove { key } => {
                                cache.remove(key);
                            }
                        }
                        assert!(cache.size() <= capacity);
                    }
                });
            }
        });

        prop_assert!(cache.is_consistent());
        prop_assert!(cache.size() <= capacity);

        runtime.block_on(cache.shutdown());
        prop_assert!(cache.is_consistent());
    }
}

// == Additional Unit Tests for Edge Cases ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_order_example() {
        let now = Instant::now();
        let mut store = CacheStore::new(2);

        store.put("a", 1, TEST_TTL, now);
        store.put("b", 2, TEST_TTL, now);
        store.get("a", now);
        store.put("c", 3, TEST_TTL, now);

        assert_eq!(store.get("a", now), Some(&1));
        assert_eq!(store.get("c", now), Some(&3));
        assert_eq!(store.get("b", now), None);
    }

    #[test]
    fn test_tie_break_evicts_first_inserted() {
        let now = Instant::now();
        let mut store = CacheStore::new(3);

        store.put("first", 1, TEST_TTL, now);
        store.put("second", 2, TEST_TTL, now);
        store.put("third", 3, TEST_TTL, now);

        let evicted = store.put("fourth", 4, TEST_TTL, now).map(|e| e.into_parts().0);
        assert_eq!(evicted, Some("first"));
    }
}
