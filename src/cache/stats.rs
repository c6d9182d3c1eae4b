//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, loads and removals.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::cache::RemovalReason;

// == Cache Stats ==
/// Point-in-time snapshot of cache metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of reads served from a resident, fresh entry
    pub hits: u64,
    /// Number of reads that found no usable entry
    pub misses: u64,
    /// Number of successful loader invocations
    pub loads: u64,
    /// Number of loader invocations that returned an error
    pub load_failures: u64,
    /// Entries displaced by a put on the same key
    pub replacements: u64,
    /// Entries removed because they expired
    pub expirations: u64,
    /// Entries evicted to respect the maximum size
    pub evictions: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Counter ==
/// Lock-free counters updated from both the shared and exclusive lock paths.
#[derive(Debug, Default)]
pub(crate) struct StatsCounter {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    replacements: AtomicU64,
    expirations: AtomicU64,
    evictions: AtomicU64,
}

impl StatsCounter {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Removal ==
    /// Counts a notifying removal under its reason.
    pub fn record_removal(&self, reason: RemovalReason) {
        let counter = match reason {
            RemovalReason::Replaced => &self.replacements,
            RemovalReason::Expired => &self.expirations,
            RemovalReason::Size => &self.evictions,
            RemovalReason::Explicit => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a snapshot for a cache currently holding `total_entries`.
    pub fn snapshot(&self, total_entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            replacements: self.replacements.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            total_entries,
        }
    }
}
