//! Caching layer
//!
//! The in-memory tiers between the application and its quota-limited
//! upstreams: the generic TTL/tag store with request deduplication, and
//! the conditional-fetch (validator token) cache.

pub mod conditional;
pub mod entry;
pub mod stats;
pub mod store;

pub use conditional::{ConditionalCache, ConditionalResponse, Refreshed};
pub use entry::{batch_cache_key, cache_key, CacheEntry};
pub use stats::{CacheStats, HotKey};
pub use store::{CacheOptions, CacheStore, Fetched, LoadError, StaleValue, SweeperHandle};
