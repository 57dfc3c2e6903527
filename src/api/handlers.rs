//! API Handlers
//!
//! HTTP request handlers for each gateway endpoint.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::client::CachedClient;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{HealthResponse, InvalidateRequest, InvalidateResponse, StatsResponse};

/// Application state shared across all handlers.
///
/// The client is cheap to clone; clones share one cache.
#[derive(Clone)]
pub struct AppState {
    pub client: CachedClient,
}

impl AppState {
    pub fn new(client: CachedClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(CachedClient::from_config(config))
    }
}

/// Handler for GET /api/*path
///
/// Returns the upstream JSON for `path`, from the cache when fresh.
pub async fn proxy_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Value>> {
    if path.trim_matches('/').is_empty() {
        return Err(CacheError::InvalidRequest(
            "Upstream path cannot be empty".to_string(),
        ));
    }

    let value = state.client.get_json(&path, &params).await?;
    Ok(Json(value))
}

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.client.cache().stats().into())
}

/// Handler for DELETE /cache
///
/// Removes keys starting with `prefix`, or everything when no prefix is given.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Query(req): Query<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let cache = state.client.cache();
    let removed = match req.prefix.as_deref() {
        Some(prefix) => cache.remove_prefix(prefix),
        None => cache.clear(),
    };
    info!(prefix = ?req.prefix, removed, "cache invalidated");

    Ok(Json(InvalidateResponse::new(req.prefix.as_deref(), removed)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
