//! Loading Cache - An in-process key-value cache
//!
//! Provides a generic cache with read/write expiry, an optional loading
//! function for misses, a size bound and removal listeners, plus a small
//! HTTP front for serving a string cache.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{Cache, CacheBuilder, RemovalNotification, RemovalReason};
pub use config::Config;
pub use error::CacheError;
pub use tasks::spawn_sweep_task;
