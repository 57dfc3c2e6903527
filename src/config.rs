//! Configuration Module
//!
//! Handles loading and managing configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheOptions;

/// Cache and gateway configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of cached responses, 0 = unbounded
    pub max_entries: usize,
    /// Default TTL in milliseconds
    pub default_ttl_ms: u64,
    /// Deadline for a pending fetch in milliseconds, 0 = none
    pub pending_timeout_ms: u64,
    /// Expired-entry sweep interval in seconds, 0 = lazy expiry only
    pub sweep_interval: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Base URL of the REST backend being cached
    pub upstream_url: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 30000)
    /// - `CACHE_PENDING_TIMEOUT_MS` - Pending fetch deadline (default: 30000)
    /// - `SWEEP_INTERVAL_SECS` - Background sweep frequency (default: 0, disabled)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `UPSTREAM_URL` - REST backend base URL (default: http://127.0.0.1:8080)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from any name -> value lookup. Unparsable values fall
    /// back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            max_entries: parsed(&lookup, "CACHE_MAX_ENTRIES").unwrap_or(defaults.max_entries),
            default_ttl_ms: parsed(&lookup, "CACHE_DEFAULT_TTL_MS")
                .unwrap_or(defaults.default_ttl_ms),
            pending_timeout_ms: parsed(&lookup, "CACHE_PENDING_TIMEOUT_MS")
                .unwrap_or(defaults.pending_timeout_ms),
            sweep_interval: parsed(&lookup, "SWEEP_INTERVAL_SECS")
                .unwrap_or(defaults.sweep_interval),
            server_port: parsed(&lookup, "SERVER_PORT").unwrap_or(defaults.server_port),
            upstream_url: lookup("UPSTREAM_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.upstream_url),
        }
    }

    /// Options for the response cache built from this configuration.
    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            max_entries: self.max_entries,
            default_ttl: Duration::from_millis(self.default_ttl_ms),
            pending_timeout: (self.pending_timeout_ms > 0)
                .then(|| Duration::from_millis(self.pending_timeout_ms)),
        }
    }
}

fn parsed<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(name).and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl_ms: 30_000,
            pending_timeout_ms: 30_000,
            sweep_interval: 0,
            server_port: 3000,
            upstream_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}
