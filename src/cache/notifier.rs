//! Removal Notifier Module
//!
//! Fans removal events out to the registered listeners.

use std::fmt;
use std::panic;
use std::sync::Arc;
use std::thread;

use serde::Serialize;

// == Removal Reason ==
/// Why an entry left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemovalReason {
    /// The entry was explicitly invalidated.
    ///
    /// Invalidation is currently silent, so no notification carries this reason.
    Explicit,
    /// The entry was replaced by a new value for the same key
    Replaced,
    /// The entry outlived its read or write expiry window
    Expired,
    /// The entry was evicted to respect the maximum size
    Size,
}

impl RemovalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalReason::Explicit => "EXPLICIT",
            RemovalReason::Replaced => "REPLACED",
            RemovalReason::Expired => "EXPIRED",
            RemovalReason::Size => "SIZE",
        }
    }
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Removal Notification ==
/// A removed entry and the reason it was removed.
///
/// Owns the key and value; the slot is already gone from the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalNotification<K, V> {
    pub key: K,
    pub value: V,
    pub reason: RemovalReason,
}

/// Callback invoked for every notifying removal.
pub type RemovalListener<K, V> = Arc<dyn Fn(&RemovalNotification<K, V>) + Send + Sync>;

// == Notifier ==
/// Ordered set of removal listeners.
pub struct Notifier<K, V> {
    listeners: Vec<RemovalListener<K, V>>,
}

impl<K, V> Notifier<K, V> {
    pub fn new(listeners: Vec<RemovalListener<K, V>>) -> Self {
        Self { listeners }
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<K: Sync, V: Sync> Notifier<K, V> {
    // == Notify ==
    /// Delivers `notification` to every listener and waits for all of them.
    ///
    /// Listeners run in parallel on scoped threads; a lone listener runs on
    /// the calling thread. Panics are not contained: once every listener has
    /// finished, the first panic is resumed on the caller.
    pub fn notify(&self, notification: &RemovalNotification<K, V>) {
        match self.listeners.as_slice() {
            [] => {}
            [listener] => listener(notification),
            listeners => {
                let panicked = thread::scope(|scope| {
                    let handles: Vec<_> = listeners
                        .iter()
                        .map(|listener| scope.spawn(move || listener(notification)))
                        .collect();
                    let failures: Vec<_> = handles
                        .into_iter()
                        .filter_map(|handle| handle.join().err())
                        .collect();
                    failures.into_iter().next()
                });
                if let Some(payload) = panicked {
                    panic::resume_unwind(payload);
                }
            }
        }
    }
}

impl<K, V> fmt::Debug for Notifier<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
