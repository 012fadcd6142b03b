//! Cache Module
//!
//! In-memory response caching with Cache-Control TTLs, LRU eviction and
//! request coalescing for in-flight fetches.

mod directives;
mod entry;
mod facade;
mod key;
mod lru;
mod pending;
mod stats;
mod store;


// Re-export public types
pub use directives::{CacheDirectives, HeaderLookup, CACHE_CONTROL};
pub use entry::CacheEntry;
pub use facade::ResponseCache;
pub use key::CacheKey;
pub use lru::LruTracker;
pub use pending::{Registration, StampedeGuard};
pub use stats::CacheStats;
pub use store::EvictionStore;
