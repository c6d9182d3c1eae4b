//! Cache Store Module
//!
//! Main cache engine: a single reader/writer-locked table with read/write
//! expiry, an optional loader for misses, a size bound and removal listeners.

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use crate::cache::options::{CacheBuilder, LoadFn};
use crate::cache::stats::StatsCounter;
use crate::cache::{
    CacheEntry, CacheStats, Clock, ExpiryPolicy, Notifier, RemovalNotification, RemovalReason,
};
use crate::error::{CacheError, Result};

type Table<K, V> = HashMap<K, CacheEntry<V>>;

// == Cache ==
/// In-process key-value cache.
///
/// Every operation is synchronous. Lookups take the shared lock; anything that
/// can change the table (including running the loader and the removal
/// listeners) holds the exclusive lock for its whole duration. Loads are
/// therefore serialized across all keys, and neither loaders nor listeners may
/// call back into the same cache.
pub struct Cache<K, V> {
    /// Key-value storage
    entries: RwLock<Table<K, V>>,
    clock: Arc<dyn Clock>,
    expiry: ExpiryPolicy,
    loader: Option<LoadFn<K, V>>,
    /// Maximum number of entries allowed, if bounded
    max_size: Option<usize>,
    notifier: Notifier<K, V>,
    /// Performance statistics
    stats: StatsCounter,
}

impl<K, V> Cache<K, V> {
    // == Constructors ==
    pub fn builder() -> CacheBuilder<K, V> {
        CacheBuilder::new()
    }

    pub(crate) fn from_builder(builder: CacheBuilder<K, V>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock: builder.clock,
            expiry: ExpiryPolicy::new(builder.expire_after_read, builder.expire_after_write),
            loader: builder.loader,
            max_size: builder.max_size,
            notifier: Notifier::new(builder.listeners),
            stats: StatsCounter::default(),
        }
    }

    // A listener panic unwinds through the exclusive guard. The slot it was
    // told about is already gone, so the table is consistent and the poison
    // flag can be ignored.
    fn read_entries(&self) -> RwLockReadGuard<'_, Table<K, V>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, Table<K, V>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    // == Length ==
    /// Returns the current number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.read_entries().is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.len())
    }

    // == Invalidate ==
    /// Removes `key` if present.
    ///
    /// Invalidation is silent: removal listeners are not notified.
    pub fn invalidate(&self, key: &K)
    where
        K: Eq + Hash,
    {
        self.write_entries().remove(key);
    }

    /// Removes every key in `keys`. Absent keys are ignored; listeners are not
    /// notified.
    pub fn invalidate_keys<'a, I>(&self, keys: I)
    where
        K: Eq + Hash + 'a,
        I: IntoIterator<Item = &'a K>,
    {
        let mut entries = self.write_entries();
        for key in keys {
            entries.remove(key);
        }
    }

    // == Invalidate All ==
    /// Clears the cache without notifying listeners.
    pub fn invalidate_all(&self) {
        self.write_entries().clear();
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync,
    V: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self::builder().build()
    }

    // == Get ==
    /// Returns the value for `key`, loading it on a miss when a loader is set.
    ///
    /// An expired entry is evicted (reason `Expired`) and treated as a miss.
    /// Without a loader, a miss is [`CacheError::NotFound`]; a failing loader
    /// yields [`CacheError::Load`] and leaves nothing cached.
    pub fn get(&self, key: &K) -> Result<V> {
        let stale = {
            let entries = self.read_entries();
            let now = self.clock.now();
            match entries.get(key) {
                Some(entry) if !self.expiry.is_expired(entry, now) => {
                    entry.touch(now);
                    self.stats.record_hit();
                    return Ok(entry.value.clone());
                }
                Some(_) => true,
                None => false,
            }
        };
        self.stats.record_miss();

        let mut entries = self.write_entries();
        if stale {
            // Only evict if still stale: a put may have refreshed it meanwhile.
            self.evict_if_expired(&mut entries, key, self.clock.now());
        }
        self.load(&mut entries, key)
    }

    // == Load ==
    /// Resolves a miss under the exclusive lock.
    fn load(&self, entries: &mut Table<K, V>, key: &K) -> Result<V> {
        // Another caller may have installed the key while we waited for the lock.
        let now = self.clock.now();
        self.evict_if_expired(entries, key, now);
        if let Some(entry) = entries.get(key) {
            entry.touch(now);
            return Ok(entry.value.clone());
        }

        let Some(load) = &self.loader else {
            return Err(CacheError::not_found(key));
        };

        debug!(?key, "Loading value for missing key");
        match load(key) {
            Ok(value) => {
                self.stats.record_load();
                let now = self.clock.now();
                self.insert(entries, key.clone(), value.clone(), now);
                Ok(value)
            }
            Err(err) => {
                self.stats.record_load_failure();
                let err = CacheError::load_failure(key, err);
                if !err.is_not_found() {
                    warn!(?key, error = %err.report(), "Loader failed");
                }
                Err(err)
            }
        }
    }

    // == Put ==
    /// Stores `value` under `key`, replacing any existing entry.
    ///
    /// Runs in order: a sweep of all expired entries, removal of the previous
    /// entry for `key` (reason `Replaced`), eviction of one arbitrary entry if
    /// the cache is full (reason `Size`), then the insert.
    pub fn put(&self, key: K, value: V) {
        let mut entries = self.write_entries();
        let now = self.clock.now();
        self.sweep(&mut entries, now);
        if entries.contains_key(&key) {
            self.evict(&mut entries, &key, RemovalReason::Replaced);
        }
        self.insert(&mut entries, key, value, now);
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, notifying listeners with `Expired`.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut entries = self.write_entries();
        let now = self.clock.now();
        self.sweep(&mut entries, now)
    }

    /// Inserts a fresh entry, first evicting one entry if the table is full.
    fn insert(&self, entries: &mut Table<K, V>, key: K, value: V, now: DateTime<Utc>) {
        if let Some(max_size) = self.max_size {
            if entries.len() >= max_size {
                // Victim is whatever the table yields first; no ordering is kept.
                if let Some(victim) = entries.keys().next().cloned() {
                    self.evict(entries, &victim, RemovalReason::Size);
                }
            }
        }
        entries.insert(key, CacheEntry::new(value, now));
    }

    fn sweep(&self, entries: &mut Table<K, V>, now: DateTime<Utc>) -> usize {
        if !self.expiry.is_enabled() {
            return 0;
        }
        let expired: Vec<K> = entries
            .iter()
            .filter(|(_, entry)| self.expiry.is_expired(entry, now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.evict(entries, key, RemovalReason::Expired);
        }
        if !expired.is_empty() {
            debug!(removed = expired.len(), "Swept expired entries");
        }
        expired.len()
    }

    fn evict_if_expired(&self, entries: &mut Table<K, V>, key: &K, now: DateTime<Utc>) {
        let expired = entries
            .get(key)
            .is_some_and(|entry| self.expiry.is_expired(entry, now));
        if expired {
            self.evict(entries, key, RemovalReason::Expired);
        }
    }

    // == Evict ==
    /// Removes `key` and notifies every listener before returning.
    ///
    /// All notifying removals go through here.
    fn evict(&self, entries: &mut Table<K, V>, key: &K, reason: RemovalReason) -> bool {
        let Some((key, entry)) = entries.remove_entry(key) else {
            return false;
        };
        self.stats.record_removal(reason);
        trace!(?key, %reason, "Evicted entry");

        if !self.notifier.is_empty() {
            let notification = RemovalNotification {
                key,
                value: entry.value,
                reason,
            };
            self.notifier.notify(&notification);
        }
        true
    }
}

impl<K, V> Default for Cache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync,
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("len", &self.len())
            .field("expiry", &self.expiry)
            .field("loader", &self.loader.is_some())
            .field("max_size", &self.max_size)
            .field("notifier", &self.notifier)
            .finish()
    }
}
