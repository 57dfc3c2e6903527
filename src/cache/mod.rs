//! Cache Module
//!
//! In-memory response caching with TTL expiration, LRU capacity bound and
//! single-flight de-duplication of in-flight fetches.

mod clock;
mod entry;
mod lru;
mod pending;
mod response;
mod stats;
mod store;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use pending::{PendingFetch, PendingTable};
pub use response::{CacheOptions, ResponseCache};
pub use stats::CacheStats;
pub use store::CacheStore;
