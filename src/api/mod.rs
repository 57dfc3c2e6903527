//! API Module
//!
//! HTTP handlers and routing for the caching gateway.
//!
//! # Endpoints
//! - `GET /api/*path` - Cached GET against the upstream REST backend
//! - `GET /cache/stats` - Cache statistics
//! - `DELETE /cache` - Invalidate cached responses
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
