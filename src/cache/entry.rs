//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use crate::cache::clock::duration_ms;

// == Cache Entry ==
/// A cached value with its creation and expiration times (Unix milliseconds).
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Creation timestamp
    pub created_at: u64,
    /// Last instant at which the entry is still fresh
    pub expires_at: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry stored at `now` that stays fresh for `ttl`.
    pub fn new(value: V, now: u64, ttl: Duration) -> Self {
        Self {
            value,
            created_at: now,
            expires_at: now.saturating_add(duration_ms(ttl)),
        }
    }

    // == Is Expired ==
    /// An entry is fresh while `now <= expires_at` and stale strictly after.
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.expires_at
    }

    // == Time To Live ==
    /// Remaining freshness in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self, now: u64) -> u64 {
        self.expires_at.saturating_sub(now)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("payload", 1_000, Duration::from_millis(500));

        assert_eq!(entry.value, "payload");
        assert_eq!(entry.created_at, 1_000);
        assert_eq!(entry.expires_at, 1_500);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new((), 0, Duration::from_millis(10));

        assert!(!entry.is_expired(9));
        assert!(!entry.is_expired(10), "still fresh exactly at expires_at");
        assert!(entry.is_expired(11));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new((), 0, Duration::from_secs(10));

        assert_eq!(entry.ttl_remaining_ms(0), 10_000);
        assert_eq!(entry.ttl_remaining_ms(9_000), 1_000);
        assert_eq!(entry.ttl_remaining_ms(20_000), 0);
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let entry = CacheEntry::new((), 5, Duration::MAX);
        assert_eq!(entry.expires_at, u64::MAX);
        assert!(!entry.is_expired(u64::MAX));
    }
}
