//! Expired Entry Sweep
//!
//! Optional background task that periodically purges expired entries.
//! Lookups already drop stale entries lazily; the sweep only bounds how long
//! never-read entries occupy memory.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ResponseCache;

/// Spawns a task that calls [`ResponseCache::purge_expired`] every
/// `interval`. Abort the returned handle to stop it.
pub fn spawn_cleanup_task<V>(cache: ResponseCache<V>, interval: Duration) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "Starting expired entry sweep");

        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = cache.purge_expired();
            if removed > 0 {
                info!("Sweep removed {} expired entries", removed);
            } else {
                debug!("Sweep found no expired entries");
            }
        }
    })
}
