//! Error types for the response cache
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the response cache.
///
/// Cloneable so that one settled fetch can hand the same failure to every
/// caller that was waiting on it.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// The underlying fetch failed; the original error is kept as-is
    #[error("{0}")]
    Fetch(Arc<anyhow::Error>),

    /// The pending fetch did not settle before its deadline
    #[error("Fetch for '{key}' timed out after {after_ms}ms")]
    Timeout { key: String, after_ms: u64 },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error (fetch task panicked or was aborted)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Wraps a fetch failure without altering it.
    pub fn fetch(err: anyhow::Error) -> Self {
        CacheError::Fetch(Arc::new(err))
    }

    /// Returns the original fetch error, if this is a fetch failure.
    pub fn fetch_error(&self) -> Option<&anyhow::Error> {
        match self {
            CacheError::Fetch(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::Fetch(err) => err
                .downcast_ref::<reqwest::Error>()
                .and_then(|e| e.status())
                .and_then(|s| StatusCode::from_u16(s.as_u16()).ok())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            CacheError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the response cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("upstream said no")]
    struct Refused;

    #[test]
    fn test_fetch_error_keeps_original() {
        let err = CacheError::fetch(anyhow::Error::new(Refused));

        assert_eq!(err.to_string(), "upstream said no");
        let original = err.fetch_error().unwrap();
        assert!(original.downcast_ref::<Refused>().is_some());
    }

    #[test]
    fn test_clone_shares_fetch_error() {
        let err = CacheError::fetch(anyhow::anyhow!("boom"));
        let copy = err.clone();

        match (&err, &copy) {
            (CacheError::Fetch(a), CacheError::Fetch(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => panic!("expected fetch errors"),
        }
    }

    #[test]
    fn test_status_mapping() {
        let timeout = CacheError::Timeout {
            key: "k".to_string(),
            after_ms: 10,
        };
        assert_eq!(
            timeout.into_response().status(),
            StatusCode::GATEWAY_TIMEOUT
        );

        let invalid = CacheError::InvalidRequest("empty key".to_string());
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);

        let fetch = CacheError::fetch(anyhow::anyhow!("connection reset"));
        assert_eq!(fetch.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
