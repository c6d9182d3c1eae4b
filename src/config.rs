//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::time::Duration;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold (0 = unbounded)
    pub max_entries: usize,
    /// Seconds an entry may go unread before expiring (0 = off)
    pub expire_after_read: u64,
    /// Seconds after a write at which an entry expires (0 = off)
    pub expire_after_write: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background expiry sweep interval in seconds
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `EXPIRE_AFTER_READ` - Read expiry in seconds (default: 0, off)
    /// - `EXPIRE_AFTER_WRITE` - Write expiry in seconds (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Expiry sweep frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            expire_after_read: env_or("EXPIRE_AFTER_READ", defaults.expire_after_read),
            expire_after_write: env_or("EXPIRE_AFTER_WRITE", defaults.expire_after_write),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            sweep_interval: env_or("SWEEP_INTERVAL", defaults.sweep_interval),
        }
    }

    pub fn expire_after_read(&self) -> Duration {
        Duration::from_secs(self.expire_after_read)
    }

    pub fn expire_after_write(&self) -> Duration {
        Duration::from_secs(self.expire_after_write)
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            expire_after_read: 0,
            expire_after_write: 300,
            server_port: 3000,
            sweep_interval: 1,
        }
    }
}
