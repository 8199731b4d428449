//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache against simple models of its behavior.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::ttl::adaptive_ttl;
use crate::cache::{AccessPattern, AdaptiveCache, ManualClock};
use crate::config::CacheConfig;

// == Test Configuration ==
const TEST_MAX_KEYS: usize = 100;
const START: u64 = 1_700_000_000_000;

fn test_cache(max_keys: usize) -> AdaptiveCache {
    AdaptiveCache::new("prop", CacheConfig::default().with_max_keys(max_keys))
        .unwrap()
        .with_clock(Arc::new(ManualClock::new(START)))
}

// == Strategies ==
/// Generates valid cache keys from a small alphabet so operations collide
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,3}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9 ]{0,32}".prop_map(|s| json!(s)),
        "[a-z]{1,8}".prop_map(|s| json!({ "field": s })),
    ]
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: Value },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (valid_key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
        valid_key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of operations, the cache agrees with a plain map and
    // the hit/miss counters match the number of found/absent reads.
    #[test]
    fn prop_cache_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let cache = test_cache(TEST_MAX_KEYS);
        let mut model: HashMap<String, Value> = HashMap::new();
        let mut expected_hits = 0;
        let mut expected_misses = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    prop_assert!(cache.set(key.clone(), value.clone()));
                    model.insert(key, value);
                }
                CacheOp::Get { key } => {
                    let got = cache.get(&key);
                    prop_assert_eq!(got.as_ref(), model.get(&key));
                    if got.is_some() {
                        expected_hits += 1;
                    } else {
                        expected_misses += 1;
                    }
                }
                CacheOp::Delete { key } => {
                    let expected = usize::from(model.remove(&key).is_some());
                    prop_assert_eq!(cache.delete(&key), expected);
                }
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits);
        prop_assert_eq!(stats.misses, expected_misses);
        prop_assert_eq!(stats.keys, model.len());
        prop_assert_eq!(stats.total_operations, expected_hits + expected_misses);
    }

    // Every stored key has an access pattern.
    #[test]
    fn prop_stored_keys_are_tracked(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let cache = test_cache(TEST_MAX_KEYS);
        let mut stored = HashSet::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    cache.set(key.clone(), value);
                    stored.insert(key);
                }
                CacheOp::Get { key } => {
                    cache.get(&key);
                }
                CacheOp::Delete { key } => {
                    cache.delete(&key);
                    stored.remove(&key);
                }
            }
        }

        for key in &stored {
            prop_assert!(cache.access_pattern(key).is_some(), "untracked key {}", key);
        }
    }

    // The key count never exceeds max_keys, and rejected writes are reported.
    #[test]
    fn prop_capacity_enforcement(
        keys in prop::collection::vec("[a-z]{1,8}", 1..80),
        max_keys in 1usize..20,
    ) {
        let cache = test_cache(max_keys);

        for key in keys {
            let was_present = cache.has(&key);
            let accepted = cache.set(key.clone(), json!(1));
            prop_assert!(cache.len() <= max_keys);
            if !accepted {
                prop_assert!(!was_present);
                prop_assert_eq!(cache.len(), max_keys);
            }
        }
    }

    // invalidate_pattern removes exactly the keys containing the substring.
    #[test]
    fn prop_invalidate_pattern_exact(
        keys in prop::collection::hash_set("[a-c:]{1,6}", 1..30),
        needle in "[a-c]{1,2}",
    ) {
        let cache = test_cache(TEST_MAX_KEYS);
        for key in &keys {
            cache.set(key.clone(), json!(key));
        }

        let expected: HashSet<&String> = keys.iter().filter(|k| k.contains(&needle)).collect();
        prop_assert_eq!(cache.invalidate_pattern(&needle), expected.len());

        for key in &keys {
            prop_assert_eq!(cache.has(key), !expected.contains(key));
        }
    }

    // With equal access intervals, more frequent keys never get a shorter TTL.
    #[test]
    fn prop_adaptive_ttl_monotonic_in_frequency(
        low in 0u64..200,
        extra in 0u64..200,
        interval in 0u64..600_000,
        base_secs in 1u64..3600,
    ) {
        let base = Duration::from_secs(base_secs);
        let pattern = |frequency| AccessPattern {
            key: "k".to_string(),
            frequency,
            last_access: 0,
            avg_access_interval_ms: interval,
            priority: 50,
        };

        let ttl_low = adaptive_ttl(base, Some(&pattern(low)));
        let ttl_high = adaptive_ttl(base, Some(&pattern(low + extra)));
        prop_assert!(ttl_high >= ttl_low);
        prop_assert!(ttl_high <= base * 6);
    }

    // Priority stays within 0..=100 for any access history.
    #[test]
    fn prop_priority_bounded(gaps in prop::collection::vec(0u64..10_000_000, 0..40), idle in 0u64..u32::MAX as u64) {
        let mut pattern = AccessPattern::new("k", 0);
        let mut now = 0;
        for gap in gaps {
            now += gap;
            pattern.record(now);
            prop_assert!(pattern.priority <= 100);
        }
        prop_assert!(pattern.priority_at(now + idle) <= 100);
    }

    // Eviction removes the lowest-priority keys and keeps the rest.
    #[test]
    fn prop_eviction_removes_lowest_priority(access_counts in prop::collection::vec(0usize..40, 9..10)) {
        let cache = test_cache(10);
        for (i, count) in access_counts.iter().enumerate() {
            let key = format!("k{}", i);
            cache.set(key.clone(), json!(i));
            for _ in 0..*count {
                cache.get(&key);
            }
        }

        let priorities: HashMap<String, u8> = (0..access_counts.len())
            .map(|i| format!("k{}", i))
            .filter_map(|key| cache.access_pattern(&key).map(|p| (key, p.priority)))
            .collect();
        let min_priority = priorities.values().copied().min().unwrap();

        let evicted = cache.optimize();
        prop_assert_eq!(evicted.len(), 1);
        prop_assert_eq!(priorities[&evicted[0]], min_priority);
        prop_assert_eq!(cache.len(), access_counts.len() - 1);

        for key in priorities.keys().filter(|key| **key != evicted[0]) {
            prop_assert!(cache.has(key));
        }
    }
}

// == Property Test for Concurrent Operation Correctness ==

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Concurrent callers always read whole values that some writer stored,
    // and the cache ends in a consistent state.
    #[test]
    fn prop_concurrent_operation_correctness(
        initial_entries in prop::collection::vec((valid_key_strategy(), value_strategy()), 1..20),
        operations in prop::collection::vec(cache_op_strategy(), 10..50)
    ) {
        let cache = Arc::new(test_cache(TEST_MAX_KEYS));

        let mut written: HashSet<String> = HashSet::new();
        for (key, value) in &initial_entries {
            cache.set(key.clone(), value.clone());
            written.insert(value.to_string());
        }
        for op in &operations {
            if let CacheOp::Set { value, .. } = op {
                written.insert(value.to_string());
            }
        }
        let written = Arc::new(written);

        let handles: Vec<_> = operations
            .into_iter()
            .map(|op| {
                let cache = Arc::clone(&cache);
                let written = Arc::clone(&written);
                std::thread::spawn(move || match op {
                    CacheOp::Set { key, value } => {
                        cache.set(key, value);
                        Ok(())
                    }
                    CacheOp::Get { key } => match cache.get(&key) {
                        Some(value) if !written.contains(&value.to_string()) => {
                            Err(format!("read a value nobody wrote for '{}': {}", key, value))
                        }
                        _ => Ok(()),
                    },
                    CacheOp::Delete { key } => {
                        cache.delete(&key);
                        Ok(())
                    }
                })
            })
            .collect();

        for handle in handles {
            let result = handle.join().expect("Thread should not panic");
            prop_assert!(result.is_ok(), "Concurrent operation failed: {:?}", result);
        }

        let stats = cache.stats();
        prop_assert!(stats.keys <= TEST_MAX_KEYS);
        prop_assert!(stats.hit_rate >= 0.0 && stats.hit_rate <= 100.0);
    }
}
