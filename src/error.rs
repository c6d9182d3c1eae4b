//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use std::fmt::Debug;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache and its HTTP surface.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache and not loadable
    #[error("Key not found: {0}")]
    NotFound(String),

    /// The loading function failed for a key
    #[error("failed to load key {key}")]
    Load {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CacheError {
    /// Not-found error for `key`.
    pub fn not_found<K: Debug + ?Sized>(key: &K) -> Self {
        CacheError::NotFound(format!("{:?}", key))
    }

    // == Load Failure ==
    /// Wraps a loader error for `key`.
    ///
    /// A loader that reports [`CacheError::NotFound`] anywhere in its error
    /// chain surfaces as a plain not-found rather than a load failure.
    pub fn load_failure<K: Debug + ?Sized>(key: &K, err: anyhow::Error) -> Self {
        let reports_not_found = err
            .chain()
            .any(|cause| matches!(cause.downcast_ref::<CacheError>(), Some(CacheError::NotFound(_))));
        if reports_not_found {
            return Self::not_found(key);
        }
        CacheError::Load {
            key: format!("{:?}", key),
            source: err,
        }
    }

    /// Renders this error followed by every cause in its source chain,
    /// separated by `": "`.
    pub fn report(&self) -> String {
        let mut message = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            message.push_str(": ");
            message.push_str(&err.to_string());
            cause = err.source();
        }
        message
    }

    /// True for the canonical "key not found" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::Load { .. } => StatusCode::BAD_GATEWAY,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": self.report()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
