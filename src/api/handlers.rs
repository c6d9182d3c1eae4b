//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::cache::{Cache, RemovalNotification};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HealthResponse, SetRequest, SetResponse,
    StatsResponse, SweepResponse,
};

/// Cache type served over HTTP.
pub type StringCache = Cache<String, String>;

/// Application state shared across all handlers.
///
/// The cache does its own locking, so handlers share it through a plain `Arc`.
/// The server configures no loader and only a logging listener, so every
/// call returns promptly and handlers invoke the cache inline.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<StringCache>,
}

impl AppState {
    /// Creates a new AppState with the given cache.
    pub fn new(cache: StringCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Every notifying removal is logged at info level.
    pub fn from_config(config: &Config) -> Self {
        let cache = Cache::builder()
            .max_size(config.max_entries)
            .expire_after_read(config.expire_after_read())
            .expire_after_write(config.expire_after_write())
            .removal_listener(log_removal)
            .build();
        Self::new(cache)
    }
}

fn log_removal(notification: &RemovalNotification<String, String>) {
    info!(
        key = %notification.key,
        reason = %notification.reason,
        "Cache entry removed"
    );
}

/// Handler for PUT /set
///
/// Stores a key-value pair in the cache, replacing any previous value.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.cache.put(req.key.clone(), req.value);

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value from the cache by key.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state.cache.get(&key)?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /del/:key
///
/// Invalidates a key. Absent keys are not an error.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    state.cache.invalidate(&key);

    Json(DeleteResponse::new(key))
}

/// Handler for DELETE /all
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.cache.invalidate_all();

    Json(ClearResponse::new())
}

/// Handler for POST /sweep
///
/// Runs the expiry sweep immediately.
pub async fn sweep_handler(State(state): State<AppState>) -> Json<SweepResponse> {
    let removed = state.cache.cleanup_expired();

    Json(SweepResponse { removed })
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().into())
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
