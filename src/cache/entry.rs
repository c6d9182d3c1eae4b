//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with read/write timestamps.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

use crate::cache::clock::to_nanos;

// == Cache Entry ==
/// A stored value plus the instants it was last written and last read.
///
/// The read timestamp is atomic because cache hits refresh it while the table
/// is only held under its shared lock.
#[derive(Debug)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Last write timestamp (Unix nanoseconds)
    last_write: i64,
    /// Last read timestamp (Unix nanoseconds)
    last_read: AtomicI64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped as both written and read at `now`.
    pub fn new(value: V, now: DateTime<Utc>) -> Self {
        let now = to_nanos(now);
        Self {
            value,
            last_write: now,
            last_read: AtomicI64::new(now),
        }
    }

    // == Touch ==
    /// Records a read at `now`.
    pub fn touch(&self, now: DateTime<Utc>) {
        self.last_read.store(to_nanos(now), Ordering::Relaxed);
    }

    /// Instant of the last write, in Unix nanoseconds.
    pub(crate) fn last_write_nanos(&self) -> i64 {
        self.last_write
    }

    /// Instant of the last read, in Unix nanoseconds.
    pub(crate) fn last_read_nanos(&self) -> i64 {
        self.last_read.load(Ordering::Relaxed)
    }
}
