//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check capacity, ordering, statistics and overwrite
//! behavior over generated operation sequences.

use proptest::prelude::*;
use std::collections::HashSet;
use std::thread::sleep;
use std::time::{Duration, Instant};

use crate::cache::{Cache, LruIndex};

// == Test Configuration ==
const TEST_MAX_KEYS: i64 = 100;
const NO_TTL: Duration = Duration::ZERO;

// == Strategies ==
/// Generates cache keys from a small alphabet so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-h]{1,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = u32> {
    any::<u32>()
}

/// Generates distinct keys, in order
fn unique_keys_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z0-9_]{1,16}", min..max).prop_map(|set| set.into_iter().collect())
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: u32 },
    Get { key: String },
    Peek { key: String },
    Invalidate { key: String },
    RemoveOldest,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        3 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        2 => key_strategy().prop_map(|key| CacheOp::Peek { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Invalidate { key }),
        1 => Just(CacheOp::RemoveOldest),
    ]
}

fn new_cache(max_keys: i64) -> Cache<u32> {
    Cache::builder().max_keys(max_keys).build().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any operation sequence, hits/misses/added match what callers saw and
    // evicted matches what left the cache.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let cache = new_cache(5);
        let mut expected_hits = 0;
        let mut expected_misses = 0;
        let mut expected_added = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    cache.set(key, value, NO_TTL);
                    expected_added += 1;
                }
                CacheOp::Get { key } => match cache.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Peek { key } => match cache.peek(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Invalidate { key } => {
                    cache.invalidate(&key);
                }
                CacheOp::RemoveOldest => {
                    cache.remove_oldest();
                }
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.added, expected_added, "Added mismatch");

        // Every added key is either still present, or was evicted exactly once.
        let live = cache.len() as u64;
        let purged = cache.purge() as u64;
        prop_assert_eq!(purged, live);
        prop_assert!(cache.stats().evicted <= expected_added);
    }

    // Map and list stay in lock-step, and size never exceeds capacity.
    #[test]
    fn prop_index_consistency(
        ops in prop::collection::vec(cache_op_strategy(), 1..120),
        capacity in 0usize..6,
    ) {
        let now = Instant::now();
        let mut index = LruIndex::new(capacity);

        for op in ops {
            match op {
                CacheOp::Set { key, value } => index.add(key, value, Duration::from_secs(60), now),
                CacheOp::Get { key } => { index.get(&key, now); }
                CacheOp::Peek { key } => { index.peek(&key, now); }
                CacheOp::Invalidate { key } => { index.remove(&key); }
                CacheOp::RemoveOldest => { index.remove_oldest(); }
            }
            index.assert_consistent();
            index.take_departures();
        }
    }

    // Setting the same key twice leaves one entry holding the second value.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy()
    ) {
        let cache = new_cache(TEST_MAX_KEYS);

        cache.set(key.clone(), value1, NO_TTL);
        cache.set(key.clone(), value2, NO_TTL);

        prop_assert_eq!(cache.len(), 1, "Should have exactly one entry after overwrite");
        prop_assert_eq!(cache.get(&key), Some(value2), "Overwrite should return new value");
    }

    // For any sequence of sets, the number of entries never exceeds capacity.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec((key_strategy(), value_strategy()), 1..200),
        capacity in 1i64..20,
    ) {
        let cache = new_cache(capacity);

        for (key, value) in entries {
            cache.set(key, value, NO_TTL);
            prop_assert!(
                cache.len() <= capacity as usize,
                "Cache size {} exceeds max {}",
                cache.len(),
                capacity
            );
        }
    }

    // Filling to capacity and adding one more key evicts the first key written.
    #[test]
    fn prop_lru_eviction_order(keys in unique_keys_strategy(3, 10), new_value in value_strategy()) {
        let capacity = keys.len() - 1;
        let (initial, extra) = keys.split_at(capacity);
        let new_key = &extra[0];
        let cache = new_cache(capacity as i64);

        for (i, key) in initial.iter().enumerate() {
            cache.set(key.clone(), i as u32, NO_TTL);
        }
        cache.set(new_key.clone(), new_value, NO_TTL);

        prop_assert_eq!(cache.len(), capacity);
        prop_assert!(cache.peek(&initial[0]).is_none(), "Oldest key should have been evicted");
        prop_assert_eq!(cache.peek(new_key), Some(new_value));
        for key in &initial[1..] {
            prop_assert!(cache.peek(key).is_some(), "Key '{}' should still exist", key);
        }
    }

    // Touching the oldest key with get spares it; with peek it does not.
    #[test]
    fn prop_get_promotes_peek_does_not(keys in unique_keys_strategy(4, 10)) {
        let capacity = keys.len() - 1;
        let (initial, extra) = keys.split_at(capacity);
        let new_key = &extra[0];

        let with_get = new_cache(capacity as i64);
        let with_peek = new_cache(capacity as i64);
        for key in initial {
            with_get.set(key.clone(), 0, NO_TTL);
            with_peek.set(key.clone(), 0, NO_TTL);
        }

        with_get.get(&initial[0]);
        with_peek.peek(&initial[0]);
        with_get.set(new_key.clone(), 1, NO_TTL);
        with_peek.set(new_key.clone(), 1, NO_TTL);

        prop_assert!(with_get.peek(&initial[0]).is_some(), "Get should protect the key");
        prop_assert!(with_get.peek(&initial[1]).is_none(), "Next oldest should go instead");
        prop_assert!(with_peek.peek(&initial[0]).is_none(), "Peek must not protect the key");
        prop_assert!(with_peek.peek(&initial[1]).is_some());
    }

    // Keys lists every live key once, most recent first, and matches Len.
    #[test]
    fn prop_keys_match_len(entries in prop::collection::vec((key_strategy(), value_strategy()), 0..60)) {
        let cache = new_cache(8);
        let mut order: Vec<String> = Vec::new();

        for (key, value) in entries {
            order.retain(|k| k != &key);
            order.insert(0, key.clone());
            cache.set(key, value, NO_TTL);
        }
        order.truncate(8);

        let keys = cache.keys();
        let unique: HashSet<_> = keys.iter().collect();
        prop_assert_eq!(unique.len(), keys.len());
        prop_assert_eq!(keys.len(), cache.len());
        prop_assert_eq!(keys, order);
    }
}

// Separate proptest block with fewer cases for time-sensitive TTL tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // An entry with TTL d is readable before d and gone from d on, without
    // any sweeper.
    #[test]
    fn prop_ttl_expiration_behavior(key in key_strategy(), value in value_strategy()) {
        let cache = new_cache(TEST_MAX_KEYS);

        cache.set(key.clone(), value, Duration::from_millis(200));
        prop_assert_eq!(cache.get(&key), Some(value), "Entry should exist before TTL expires");

        sleep(Duration::from_millis(250));

        prop_assert_eq!(cache.get(&key), None, "Entry should not be found after TTL expires");
        prop_assert_eq!(cache.len(), 0);
    }
}
