//! Pending Fetch Module
//!
//! Registry of in-flight fetches, at most one per key.

use std::collections::HashMap;

use futures::future::{BoxFuture, Shared};

use crate::error::Result;

/// Handle to an in-flight fetch. Every clone resolves to the same outcome.
pub type PendingFetch<V> = Shared<BoxFuture<'static, Result<V>>>;

struct Flight<V> {
    id: u64,
    fetch: PendingFetch<V>,
}

// == Pending Table ==
/// Maps keys to their in-flight fetch.
///
/// Each registration gets a fresh id so that a settled fetch can only
/// unregister itself, never a newer fetch registered under the same key.
pub struct PendingTable<V> {
    next_id: u64,
    flights: HashMap<String, Flight<V>>,
}

impl<V> Default for PendingTable<V> {
    fn default() -> Self {
        Self {
            next_id: 0,
            flights: HashMap::new(),
        }
    }
}

impl<V: Clone> PendingTable<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the id for the next registration.
    pub fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn get(&self, key: &str) -> Option<PendingFetch<V>> {
        self.flights.get(key).map(|flight| flight.fetch.clone())
    }

    /// Registers `fetch` under `key`, replacing any previous registration.
    pub fn insert(&mut self, key: String, id: u64, fetch: PendingFetch<V>) {
        self.flights.insert(key, Flight { id, fetch });
    }

    /// Removes the registration for `key` only if it is still `id`.
    pub fn remove_if_current(&mut self, key: &str, id: u64) -> bool {
        match self.flights.get(key) {
            Some(flight) if flight.id == id => {
                self.flights.remove(key);
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) -> usize {
        let count = self.flights.len();
        self.flights.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }
}
