//! Response Cache - a concurrency-safe, time-bounded cache for HTTP responses
//!
//! Serves identical in-flight or recently completed requests from memory.
//! Entries live for their `Cache-Control: max-age` (or a default TTL), the
//! store is bounded with LRU eviction, and concurrent callers for the same
//! key share a single fetch.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheKey, Registration, ResponseCache};
pub use client::{CachedClient, CachedResponse, Fetcher, ReqwestFetcher, RequestSpec};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::{spawn_cleanup_task, spawn_cleanup_task_from_config};
