//! Expiry Policy Module
//!
//! Decides whether an entry is stale given the configured read/write expiry.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cache::clock::to_nanos;
use crate::cache::CacheEntry;

// == Expiry Policy ==
/// Read and write expiry windows. `None` disables the corresponding check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryPolicy {
    /// Maximum time an entry may go unread
    pub after_read: Option<Duration>,
    /// Maximum time since an entry was written
    pub after_write: Option<Duration>,
}

impl ExpiryPolicy {
    /// Builds a policy, treating zero durations as "not configured".
    pub fn new(after_read: Option<Duration>, after_write: Option<Duration>) -> Self {
        Self {
            after_read: after_read.filter(|d| !d.is_zero()),
            after_write: after_write.filter(|d| !d.is_zero()),
        }
    }

    /// True if any expiry window is configured.
    pub fn is_enabled(&self) -> bool {
        self.after_read.is_some() || self.after_write.is_some()
    }

    // == Is Expired ==
    /// Checks whether `entry` is stale at `now`.
    ///
    /// An entry whose age equals the window exactly is still fresh; only
    /// strictly exceeding the window expires it. The two windows are checked
    /// independently and either one can expire the entry.
    pub fn is_expired<V>(&self, entry: &CacheEntry<V>, now: DateTime<Utc>) -> bool {
        let now = to_nanos(now);
        if let Some(window) = self.after_read {
            if exceeds(entry.last_read_nanos(), window, now) {
                return true;
            }
        }
        if let Some(window) = self.after_write {
            if exceeds(entry.last_write_nanos(), window, now) {
                return true;
            }
        }
        false
    }
}

fn exceeds(since: i64, window: Duration, now: i64) -> bool {
    // i128 keeps `since + window` from overflowing at the far ends of the range.
    let window = i128::try_from(window.as_nanos()).unwrap_or(i128::MAX);
    i128::from(since).saturating_add(window) < i128::from(now)
}
