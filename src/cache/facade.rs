//! Response Cache Facade
//!
//! Composes the eviction store, directive parsing and the stampede guard
//! into the operations a request orchestrator calls.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::cache::{
    CacheDirectives, CacheKey, CacheStats, EvictionStore, HeaderLookup, Registration,
    StampedeGuard,
};
use crate::config::CacheConfig;
use crate::error::Result;

// == Response Cache ==
/// Shared, thread-safe response cache.
///
/// Values are held as `Arc<V>`; `get` hands back the same allocation that was
/// added. Each operation takes its lock for the duration of that operation
/// only, so unrelated keys never serialize behind one another's fetches.
#[derive(Debug)]
pub struct ResponseCache<V> {
    store: Mutex<EvictionStore<Arc<V>>>,
    pending: StampedeGuard,
    default_max_age: Duration,
    wait_timeout: Duration,
    poll_interval: Duration,
}

impl<V> ResponseCache<V> {
    // == Constructors ==
    /// Creates a cache from a validated configuration.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(
            config.capacity,
            config.method_set(),
            config.default_max_age(),
            config.wait_timeout(),
            config.poll_interval(),
        ))
    }

    fn from_parts(
        capacity: usize,
        cacheable_methods: HashSet<String>,
        default_max_age: Duration,
        wait_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store: Mutex::new(EvictionStore::new(capacity, cacheable_methods)),
            pending: StampedeGuard::new(),
            default_max_age,
            wait_timeout,
            poll_interval,
        }
    }

    // == Register ==
    /// Claims the right to fetch `key`, waiting for any in-flight fetch of it.
    ///
    /// Uses the configured wait timeout.
    pub async fn register(&self, key: &CacheKey) -> Result<Registration> {
        self.register_with_timeout(key, self.wait_timeout).await
    }

    /// Like `register` with an explicit wait ceiling.
    pub async fn register_with_timeout(
        &self,
        key: &CacheKey,
        timeout: Duration,
    ) -> Result<Registration> {
        self.pending
            .register(key, timeout, self.poll_interval, || {
                self.lock_store().peek_valid(key)
            })
            .await
    }

    // == Release ==
    /// Frees the pending slot for `key`. Safe on every exit path.
    pub fn release(&self, key: &CacheKey) {
        self.pending.release(key);
    }

    // == Has Valid Entry ==
    /// True iff a fresh entry exists; expired entries are purged.
    pub fn has_valid_entry(&self, key: &CacheKey) -> bool {
        self.lock_store().has_valid_entry(key)
    }

    // == Get ==
    /// Returns the stored value. Call only after a positive `has_valid_entry`.
    pub fn get(&self, key: &CacheKey) -> Result<Arc<V>> {
        self.lock_store().get(key)
    }

    /// `has_valid_entry` and `get` under a single lock.
    pub fn lookup(&self, key: &CacheKey) -> Option<Arc<V>> {
        let mut store = self.lock_store();
        if store.has_valid_entry(key) {
            store.get(key).ok()
        } else {
            None
        }
    }

    // == Add ==
    /// Offers a fetched value for storage according to its headers, then
    /// releases the pending slot for `key`.
    ///
    /// Returns whether the value was stored.
    pub fn add<H>(&self, key: &CacheKey, value: impl Into<Arc<V>>, headers: &H) -> bool
    where
        H: HeaderLookup + ?Sized,
    {
        let directives = CacheDirectives::from_headers(headers);
        let stored = self
            .lock_store()
            .add(key.clone(), value.into(), &directives, self.default_max_age);
        if stored {
            debug!("Added a new entry to cache for {} key", key);
        }
        self.release(key);
        stored
    }

    // == Delete ==
    pub fn delete(&self, key: &CacheKey) {
        self.lock_store().delete(key);
    }

    // == Clear ==
    /// Drops every stored entry. Pending fetches are unaffected.
    pub fn clear(&self) {
        self.lock_store().clear();
        debug!("Cache cleared");
    }

    // == Maintenance ==
    /// Eagerly removes expired entries, returning how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        self.lock_store().cleanup_expired()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.lock_store().stats();
        stats.pending = self.pending.len();
        stats
    }

    pub fn len(&self) -> usize {
        self.lock_store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_store().is_empty()
    }

    pub fn is_pending(&self, key: &CacheKey) -> bool {
        self.pending.is_pending(key)
    }

    fn lock_store(&self) -> MutexGuard<'_, EvictionStore<Arc<V>>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V> Default for ResponseCache<V> {
    fn default() -> Self {
        let config = CacheConfig::default();
        Self::from_parts(
            config.capacity,
            config.method_set(),
            config.default_max_age(),
            config.wait_timeout(),
            config.poll_interval(),
        )
    }
}
