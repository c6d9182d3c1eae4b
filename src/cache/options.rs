//! Cache Options Module
//!
//! Construction-time configuration for [`Cache`]. Everything set here is
//! frozen once the cache is built.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Cache, Clock, RemovalListener, RemovalNotification, SystemClock};

/// Function used to materialize a value for a missing key.
pub type LoadFn<K, V> = Box<dyn Fn(&K) -> anyhow::Result<V> + Send + Sync>;

// == Cache Builder ==
/// Builder for [`Cache`].
///
/// Zero durations and a zero maximum size mean "not configured".
pub struct CacheBuilder<K, V> {
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) expire_after_read: Option<Duration>,
    pub(crate) expire_after_write: Option<Duration>,
    pub(crate) loader: Option<LoadFn<K, V>>,
    pub(crate) max_size: Option<usize>,
    pub(crate) listeners: Vec<RemovalListener<K, V>>,
}

impl<K, V> CacheBuilder<K, V> {
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            expire_after_read: None,
            expire_after_write: None,
            loader: None,
            max_size: None,
            listeners: Vec::new(),
        }
    }

    /// Replaces the time source, typically with a `MockClock` in tests.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Expires entries not read for longer than `duration`.
    pub fn expire_after_read(mut self, duration: Duration) -> Self {
        self.expire_after_read = Some(duration);
        self
    }

    /// Expires entries written longer than `duration` ago.
    pub fn expire_after_write(mut self, duration: Duration) -> Self {
        self.expire_after_write = Some(duration);
        self
    }

    // == Loader ==
    /// Sets the function invoked by `get` on a miss.
    ///
    /// The loader runs while the cache holds its exclusive lock, so it must
    /// not call back into the same cache.
    pub fn loader<F>(mut self, load: F) -> Self
    where
        F: Fn(&K) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        self.loader = Some(Box::new(load));
        self
    }

    /// Bounds the number of entries. Zero leaves the cache unbounded.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size).filter(|&n| n > 0);
        self
    }

    // == Removal Listener ==
    /// Appends a removal listener. Listeners are kept in registration order.
    ///
    /// Listeners run while the cache holds its exclusive lock and must not
    /// call back into the same cache.
    pub fn removal_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(&RemovalNotification<K, V>) + Send + Sync + 'static,
    {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn build(self) -> Cache<K, V> {
        Cache::from_builder(self)
    }
}

impl<K, V> Default for CacheBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for CacheBuilder<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBuilder")
            .field("expire_after_read", &self.expire_after_read)
            .field("expire_after_write", &self.expire_after_write)
            .field("loader", &self.loader.is_some())
            .field("max_size", &self.max_size)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
