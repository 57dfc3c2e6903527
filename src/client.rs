//! Cached JSON Client
//!
//! GET requests against a REST backend, answered through the response
//! cache. Identical concurrent requests share one upstream call.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::error::Result;
use crate::key::RequestKey;

/// HTTP client whose GETs go through a shared [`ResponseCache`].
#[derive(Clone)]
pub struct CachedClient {
    http: Client,
    base_url: String,
    cache: ResponseCache<Value>,
    ttl: Option<Duration>,
}

impl CachedClient {
    pub fn new(base_url: impl Into<String>, cache: ResponseCache<Value>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            cache,
            ttl: None,
        }
    }

    /// Creates a client for the configured upstream with a fresh cache.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.upstream_url.clone(),
            ResponseCache::new(config.cache_options()),
        )
    }

    /// Overrides the cache's default TTL for responses fetched by this client.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn cache(&self) -> &ResponseCache<Value> {
        &self.cache
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute upstream URL for `path`.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Cache key used for a GET of `path` with `params`.
    pub fn key_for(path: &str, params: &[(String, String)]) -> String {
        RequestKey::get(format!("/{}", path.trim_start_matches('/')))
            .params(params.iter().cloned())
            .to_string()
    }

    // == Get JSON ==
    /// Fetches `path` as JSON, from the cache when fresh.
    ///
    /// Non-2xx upstream responses are fetch failures and are not cached.
    pub async fn get_json(&self, path: &str, params: &[(String, String)]) -> Result<Value> {
        let key = Self::key_for(path, params);
        let url = self.url_for(path);
        let http = self.http.clone();
        let params = params.to_vec();

        self.cache
            .get_or_fetch(key, self.ttl, move || fetch_json(http, url, params))
            .await
    }
}

async fn fetch_json(http: Client, url: String, params: Vec<(String, String)>) -> anyhow::Result<Value> {
    debug!(url = %url, "fetching upstream");
    let response = http
        .get(&url)
        .query(&params)
        .send()
        .await?
        .error_for_status()?;
    Ok(response.json().await?)
}
