//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache against its documented behaviour.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::cache::{Cache, MockClock, RemovalNotification, RemovalReason};

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;

type Recorded = Arc<Mutex<Vec<RemovalNotification<String, String>>>>;

// == Strategies ==
/// Generates cache keys from a small alphabet so operations collide
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-f]{1,2}".prop_map(|s| s)
}

/// Generates cache values
fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,64}".prop_map(|s| s)
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, value: String },
    Get { key: String },
    Invalidate { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Put { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Invalidate { key }),
    ]
}

fn recorded_cache(max_size: usize) -> (Cache<String, String>, Recorded) {
    let seen: Recorded = Arc::default();
    let sink = seen.clone();
    let cache = Cache::builder()
        .max_size(max_size)
        .removal_listener(move |n: &RemovalNotification<String, String>| {
            sink.lock().unwrap().push(n.clone())
        })
        .build();
    (cache, seen)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Any operation sequence on an unbounded, non-expiring cache behaves like a
    // plain map, and the hit/miss counters match what the caller observed.
    #[test]
    fn prop_behaves_like_map(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let cache: Cache<String, String> = Cache::new();
        let mut model: HashMap<String, String> = HashMap::new();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    cache.put(key.clone(), value.clone());
                    model.insert(key, value);
                }
                CacheOp::Get { key } => {
                    match (cache.get(&key), model.get(&key)) {
                        (Ok(got), Some(want)) => {
                            prop_assert_eq!(&got, want);
                            expected_hits += 1;
                        }
                        (Err(err), None) => {
                            prop_assert!(err.is_not_found());
                            expected_misses += 1;
                        }
                        (got, want) => {
                            prop_assert!(false, "cache returned {:?}, model has {:?}", got, want);
                        }
                    }
                }
                CacheOp::Invalidate { key } => {
                    cache.invalidate(&key);
                    model.remove(&key);
                }
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, model.len(), "Total entries mismatch");
    }

    // Invalidation never reaches removal listeners.
    #[test]
    fn prop_invalidate_is_silent(
        keys in prop::collection::hash_set(key_strategy(), 1..10),
        value in value_strategy()
    ) {
        let (cache, seen) = recorded_cache(0);

        for key in &keys {
            cache.put(key.clone(), value.clone());
        }
        let first = keys.iter().next().cloned().unwrap();
        cache.invalidate(&first);
        prop_assert!(cache.get(&first).unwrap_err().is_not_found());

        cache.invalidate_keys(keys.iter());
        cache.invalidate_all();

        prop_assert!(cache.is_empty());
        prop_assert!(seen.lock().unwrap().is_empty());
    }

    // Overwriting a key emits exactly one Replaced notification with the old value.
    #[test]
    fn prop_overwrite_notifies_old_value(
        key in key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy()
    ) {
        let (cache, seen) = recorded_cache(0);

        cache.put(key.clone(), value1.clone());
        cache.put(key.clone(), value2.clone());

        prop_assert_eq!(cache.get(&key).unwrap(), value2);
        prop_assert_eq!(cache.len(), 1);

        let seen = seen.lock().unwrap();
        prop_assert_eq!(seen.len(), 1);
        prop_assert_eq!(&seen[0].key, &key);
        prop_assert_eq!(&seen[0].value, &value1);
        prop_assert_eq!(seen[0].reason, RemovalReason::Replaced);
    }

    // The table never exceeds its bound, and every entry pushed out by a
    // fresh key is reported with reason Size.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec((key_strategy(), value_strategy()), 1..200),
        max_entries in 1usize..10
    ) {
        let (cache, seen) = recorded_cache(max_entries);
        let mut resident = std::collections::HashSet::new();
        let mut expected_size_evictions = 0;
        let mut processed = 0;

        for (key, value) in entries {
            let is_new = !resident.contains(&key);
            if is_new && resident.len() >= max_entries {
                expected_size_evictions += 1;
            }
            cache.put(key.clone(), value);
            prop_assert!(
                cache.len() <= max_entries,
                "Cache size {} exceeds max {}",
                cache.len(),
                max_entries
            );

            let seen = seen.lock().unwrap();
            for n in &seen[processed..] {
                if n.reason == RemovalReason::Size {
                    resident.remove(&n.key);
                }
            }
            processed = seen.len();
            resident.insert(key);
        }

        let size_evictions = seen
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.reason == RemovalReason::Size)
            .count();
        prop_assert_eq!(size_evictions, expected_size_evictions);
        prop_assert_eq!(cache.stats().evictions, expected_size_evictions as u64);
    }
}

// Expiry properties run against a mock clock, so they need no sleeping.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // A value read at t0 is still there at t0 + d and gone at t0 + d + 1ns.
    #[test]
    fn prop_read_expiry_boundary(
        key in key_strategy(),
        value in value_strategy(),
        window_ms in 1u64..10_000,
        idle_ms in 0u64..10_000
    ) {
        let clock = Arc::new(MockClock::new());
        let window = Duration::from_millis(window_ms);
        let cache = Cache::builder()
            .clock(clock.clone())
            .expire_after_read(window)
            .build();

        cache.put(key.clone(), value.clone());
        clock.add(Duration::from_millis(idle_ms.min(window_ms)));
        prop_assert_eq!(cache.get(&key).unwrap(), value.clone());

        clock.add(window);
        prop_assert_eq!(cache.get(&key).unwrap(), value);

        clock.add(window + Duration::from_nanos(1));
        prop_assert!(cache.get(&key).unwrap_err().is_not_found());
    }

    // Reads do not extend a write expiry window.
    #[test]
    fn prop_write_expiry_ignores_reads(
        key in key_strategy(),
        value in value_strategy(),
        reads in 1usize..10
    ) {
        let clock = Arc::new(MockClock::new());
        let window = Duration::from_secs(60);
        let step = window / reads as u32;
        let cache = Cache::builder()
            .clock(clock.clone())
            .expire_after_write(window)
            .build();

        cache.put(key.clone(), value.clone());
        for _ in 0..reads {
            clock.add(step);
            prop_assert_eq!(cache.get(&key).unwrap(), value.clone());
        }

        clock.add(window - step * reads as u32 + Duration::from_nanos(1));
        prop_assert!(cache.get(&key).unwrap_err().is_not_found());
    }
}

// == Property Test for Concurrent Operation Correctness ==
// Threads share the cache through Arc; the cache does its own locking.

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Concurrent readers and writers always observe complete values, and the
    // bound holds once they are done.
    #[test]
    fn prop_concurrent_operation_correctness(
        initial_entries in prop::collection::vec((key_strategy(), value_strategy()), 1..20),
        operations in prop::collection::vec(cache_op_strategy(), 10..50)
    ) {
        let cache: Arc<Cache<String, String>> = Arc::new(
            Cache::builder()
                .max_size(TEST_MAX_ENTRIES)
                .loader(|key: &String| Ok(format!("loaded_{}", key)))
                .build(),
        );

        let mut written: std::collections::HashSet<String> = std::collections::HashSet::new();
        for (key, value) in &initial_entries {
            cache.put(key.clone(), value.clone());
            written.insert(value.clone());
        }
        for op in &operations {
            if let CacheOp::Put { value, .. } = op {
                written.insert(value.clone());
            }
        }
        let written = Arc::new(written);

        let handles: Vec<_> = operations
            .into_iter()
            .map(|op| {
                let cache = Arc::clone(&cache);
                let written = Arc::clone(&written);
                thread::spawn(move || -> Result<(), String> {
                    match op {
                        CacheOp::Put { key, value } => cache.put(key, value),
                        CacheOp::Get { key } => {
                            let value = cache.get(&key).map_err(|e| e.to_string())?;
                            if value != format!("loaded_{}", key) && !written.contains(&value) {
                                return Err(format!("Unexpected value {:?} for key {:?}", value, key));
                            }
                        }
                        CacheOp::Invalidate { key } => cache.invalidate(&key),
                    }
                    Ok(())
                })
            })
            .collect();

        for handle in handles {
            let result = handle.join().expect("Thread should not panic");
            prop_assert!(result.is_ok(), "Concurrent operation failed: {:?}", result);
        }

        let stats = cache.stats();
        prop_assert!(stats.total_entries <= TEST_MAX_ENTRIES);
        let hit_rate = stats.hit_rate();
        prop_assert!((0.0..=1.0).contains(&hit_rate), "Hit rate out of range: {}", hit_rate);
    }
}

// == Property Test for Error Response Format ==
// This tests the CacheError -> HTTP response conversion

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Every error variant renders as JSON with a string "error" field.
    #[test]
    fn prop_error_response_format(
        error_msg in "[a-zA-Z0-9 _-]{1,100}"
    ) {
        use crate::error::CacheError;
        use axum::body::to_bytes;
        use axum::response::IntoResponse;

        let error_variants = vec![
            CacheError::NotFound(error_msg.clone()),
            CacheError::InvalidRequest(error_msg.clone()),
            CacheError::load_failure(&error_msg, anyhow::anyhow!(error_msg.clone())),
        ];

        let rt = tokio::runtime::Runtime::new().unwrap();
        for error in error_variants {
            let expected_msg = error.report();
            let response = error.into_response();

            let content_type = response.headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok());
            prop_assert!(
                content_type.map(|ct| ct.contains("application/json")).unwrap_or(false),
                "Response should have JSON content-type"
            );

            let bytes = rt.block_on(async {
                to_bytes(response.into_body(), usize::MAX).await.unwrap()
            });
            let json: serde_json::Value = serde_json::from_slice(&bytes)
                .expect("Response body should be valid JSON");

            prop_assert_eq!(json["error"].as_str(), Some(expected_msg.as_str()));
        }
    }
}
