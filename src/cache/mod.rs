//! Cache Module
//!
//! Provides an in-process loading cache with read/write expiry, a size bound
//! and removal notification.

mod clock;
mod entry;
mod expiry;
mod notifier;
mod options;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use clock::{Clock, MockClock, SystemClock};
pub use entry::CacheEntry;
pub use expiry::ExpiryPolicy;
pub use notifier::{Notifier, RemovalListener, RemovalNotification, RemovalReason};
pub use options::{CacheBuilder, LoadFn};
pub use stats::CacheStats;
pub use store::Cache;
