//! Response Cache - read-through caching for REST reads
//!
//! Caches responses for a TTL, bounds the cache with LRU eviction, and
//! coalesces concurrent requests for the same key into one upstream call.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod key;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheOptions, CacheStats, PendingFetch, ResponseCache};
pub use client::CachedClient;
pub use config::Config;
pub use error::{CacheError, Result};
pub use key::RequestKey;
pub use tasks::spawn_cleanup_task;
