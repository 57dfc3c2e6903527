//! Response Cache Module
//!
//! Read-through caching with single-flight request coalescing.
//!
//! A lookup is answered from a fresh entry when possible; otherwise the
//! caller joins the fetch already in flight for the key, or starts one. The
//! check and the registration happen under one lock, so at most one
//! underlying fetch per key runs at any time.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::cache::clock::{duration_ms, Clock, SystemClock};
use crate::cache::{CacheStats, CacheStore, PendingFetch, PendingTable};
use crate::error::{CacheError, Result};

// == Cache Options ==
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Capacity bound enforced by LRU eviction, 0 = unbounded
    pub max_entries: usize,
    /// TTL used when a caller does not pass one
    pub default_ttl: Duration,
    /// Deadline for every pending fetch, None = wait forever
    pub pending_timeout: Option<Duration>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl: Duration::from_millis(30_000),
            pending_timeout: Some(Duration::from_millis(30_000)),
        }
    }
}

struct State<V> {
    store: CacheStore<V>,
    pending: PendingTable<V>,
}

struct Inner<V> {
    state: Mutex<State<V>>,
    clock: Arc<dyn Clock>,
    pending_timeout: Option<Duration>,
}

impl<V> Inner<V> {
    // No user code runs while the lock is held, so a poisoned lock still
    // guards consistent maps.
    fn lock(&self) -> MutexGuard<'_, State<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// == Response Cache ==
/// Cloneable handle to a TTL cache with in-flight request de-duplication.
///
/// Clones share the same maps. Registering a fetch spawns it on the current
/// tokio runtime, so it settles (and cleans up after itself) even if nobody
/// awaits it.
pub struct ResponseCache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for ResponseCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> ResponseCache<V> {
    pub fn new(options: CacheOptions) -> Self {
        Self::with_clock(options, Arc::new(SystemClock))
    }

    pub fn with_clock(options: CacheOptions, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    store: CacheStore::new(options.max_entries, options.default_ttl),
                    pending: PendingTable::new(),
                }),
                clock,
                pending_timeout: options.pending_timeout,
            }),
        }
    }

    // == Get ==
    /// Returns the cached value while fresh; expired entries are dropped.
    pub fn get(&self, key: &str) -> Option<V> {
        if key.is_empty() {
            return None;
        }
        let now = self.inner.clock.now_ms();
        self.inner.lock().store.get(key, now)
    }

    // == Set ==
    /// Overwrites the entry for `key`, fresh for `ttl` (default TTL if None).
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) -> Result<()> {
        let now = self.inner.clock.now_ms();
        self.inner.lock().store.set(key.into(), value, ttl, now)
    }

    // == Get Pending ==
    pub fn get_pending(&self, key: &str) -> Option<PendingFetch<V>> {
        self.inner.lock().pending.get(key)
    }

    // == Set Pending ==
    /// Registers `operation` as the in-flight fetch for `key`, replacing any
    /// previous registration, and spawns it.
    ///
    /// The registration is removed once the operation settles, whatever the
    /// outcome. The result is not cached; callers driving the protocol by
    /// hand call [`ResponseCache::set`] themselves. Use
    /// [`ResponseCache::get_or_fetch`] for the atomic check-then-register.
    pub fn set_pending<Fut>(&self, key: impl Into<String>, operation: Fut) -> Result<PendingFetch<V>>
    where
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let key = key.into();
        validate_key(&key)?;

        let (guard, tx, pending) = {
            let mut state = self.inner.lock();
            self.reserve(&mut state, key, None)
        };
        debug!(key = %guard.key, "registered pending fetch");
        spawn_flight(guard, tx, operation);

        Ok(pending)
    }

    // == Get Or Fetch ==
    /// Read-through lookup.
    ///
    /// 1. fresh entry: returned without any fetch;
    /// 2. fetch already pending: awaited and shared;
    /// 3. otherwise `fetch` is started, registered, and its successful result
    ///    cached for `ttl`. Failures are handed to every waiter and never
    ///    cached.
    ///
    /// Must be called within a tokio runtime.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: impl Into<String>,
        ttl: Option<Duration>,
        fetch: F,
    ) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let key = key.into();
        validate_key(&key)?;
        let now = self.inner.clock.now_ms();

        let (pending, flight) = {
            let mut state = self.inner.lock();
            if let Some(value) = state.store.get(&key, now) {
                return Ok(value);
            }
            match state.pending.get(&key) {
                Some(pending) => {
                    state.store.stats_mut().record_coalesced();
                    debug!(key = %key, "joining pending fetch");
                    (pending, None)
                }
                None => {
                    let ttl = ttl.unwrap_or_else(|| state.store.default_ttl());
                    let (guard, tx, pending) = self.reserve(&mut state, key, Some(ttl));
                    (pending, Some((guard, tx)))
                }
            }
        };

        if let Some((guard, tx)) = flight {
            debug!(key = %guard.key, "cache miss, starting fetch");
            // The guard already exists, so a panicking `fetch` still
            // unregisters the key.
            spawn_flight(guard, tx, fetch());
        }

        pending.await
    }

    // == Invalidation ==
    /// Removes the cached entry for `key`. Pending fetches are unaffected.
    pub fn remove(&self, key: &str) -> bool {
        self.inner.lock().store.remove(key)
    }

    /// Removes every cached entry whose key starts with `prefix`.
    pub fn remove_prefix(&self, prefix: &str) -> usize {
        self.inner.lock().store.remove_prefix(prefix)
    }

    /// Drops every entry and every pending registration.
    ///
    /// Fetches already running keep going and still answer their waiters,
    /// but their results are no longer written to the cache.
    pub fn clear(&self) -> usize {
        let mut state = self.inner.lock();
        let pending = state.pending.clear();
        let entries = state.store.clear();
        debug!(entries, pending, "cache cleared");
        entries
    }

    /// Removes every expired entry.
    pub fn purge_expired(&self) -> usize {
        let now = self.inner.clock.now_ms();
        self.inner.lock().store.purge_expired(now)
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let state = self.inner.lock();
        let mut stats = state.store.stats();
        stats.pending = state.pending.len();
        stats
    }

    pub fn len(&self) -> usize {
        self.inner.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().store.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Inserts a new registration for `key` whose outcome arrives through
    /// the returned sender.
    fn reserve(
        &self,
        state: &mut State<V>,
        key: String,
        populate: Option<Duration>,
    ) -> (FlightGuard<V>, oneshot::Sender<Result<V>>, PendingFetch<V>) {
        let id = state.pending.next_id();
        let (tx, rx) = oneshot::channel();
        let pending: PendingFetch<V> = async move {
            rx.await.unwrap_or_else(|_| {
                Err(CacheError::Internal(
                    "fetch ended without a result".to_string(),
                ))
            })
        }
        .boxed()
        .shared();

        state.pending.insert(key.clone(), id, pending.clone());
        state.store.stats_mut().record_fetch();

        let guard = FlightGuard {
            inner: Arc::clone(&self.inner),
            key,
            id,
            populate,
            settled: false,
        };
        (guard, tx, pending)
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest(
            "Key cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Runs `operation` under the pending deadline, settles the registration,
/// then hands the outcome to the waiters.
fn spawn_flight<V, Fut>(guard: FlightGuard<V>, tx: oneshot::Sender<Result<V>>, operation: Fut)
where
    V: Clone + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
{
    tokio::spawn(async move {
        let outcome = match guard.inner.pending_timeout {
            Some(limit) => match tokio::time::timeout(limit, operation).await {
                Ok(result) => result.map_err(CacheError::fetch),
                Err(_) => Err(CacheError::Timeout {
                    key: guard.key.clone(),
                    after_ms: duration_ms(limit),
                }),
            },
            None => operation.await.map_err(CacheError::fetch),
        };

        guard.settle(&outcome);
        // Every waiter may have gone away; the cache is already settled.
        let _ = tx.send(outcome);
    });
}

// == Flight Guard ==
/// Owns a pending registration until its fetch settles.
///
/// Dropped without settling (panic, runtime shutdown), it still removes the
/// registration so the key does not stay pending forever.
struct FlightGuard<V: Clone> {
    inner: Arc<Inner<V>>,
    key: String,
    id: u64,
    populate: Option<Duration>,
    settled: bool,
}

impl<V: Clone> FlightGuard<V> {
    fn settle(mut self, outcome: &Result<V>) {
        self.settled = true;
        let now = self.inner.clock.now_ms();
        let mut state = self.inner.lock();
        let current = state.pending.remove_if_current(&self.key, self.id);

        match outcome {
            Ok(value) => {
                if let (true, Some(ttl)) = (current, self.populate) {
                    if let Err(err) = state.store.set(self.key.clone(), value.clone(), Some(ttl), now) {
                        warn!(key = %self.key, error = %err, "could not cache fetched value");
                    }
                }
                debug!(key = %self.key, superseded = !current, "fetch settled");
            }
            Err(err) => {
                if matches!(err, CacheError::Timeout { .. }) {
                    state.store.stats_mut().record_timeout();
                }
                state.store.stats_mut().record_fetch_failure();
                warn!(key = %self.key, error = %err, "fetch failed");
            }
        }
    }
}

impl<V: Clone> Drop for FlightGuard<V> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.inner.lock();
        if state.pending.remove_if_current(&self.key, self.id) {
            state.store.stats_mut().record_fetch_failure();
            warn!(key = %self.key, "fetch ended without settling");
        }
    }
}
