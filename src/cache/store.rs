//! Eviction Store Module
//!
//! Bounded response storage combining a HashMap with LRU tracking and
//! TTL expiry derived from `Cache-Control` directives.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CacheDirectives, CacheEntry, CacheKey, CacheStats, LruTracker};
use crate::error::{CacheError, Result};

// == Eviction Store ==
/// Capacity-bounded key → entry map.
///
/// Not synchronized; the facade wraps it in a mutex so each operation is
/// atomic with respect to other callers.
#[derive(Debug)]
pub struct EvictionStore<V> {
    entries: HashMap<CacheKey, CacheEntry<V>>,
    lru: LruTracker<CacheKey>,
    stats: CacheStats,
    capacity: usize,
    cacheable_methods: HashSet<String>,
}

impl<V: Clone> EvictionStore<V> {
    // == Constructor ==
    /// Creates a store holding at most `capacity` entries for the given
    /// (upper-case) request methods.
    pub fn new(capacity: usize, cacheable_methods: HashSet<String>) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            capacity,
            cacheable_methods,
        }
    }

    // == Has Valid Entry ==
    /// Returns true iff the key is present and fresh.
    ///
    /// A hit becomes most recently used. An expired entry is removed.
    pub fn has_valid_entry(&mut self, key: &CacheKey) -> bool {
        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                return false;
            }
            Some(entry) => entry.is_expired(),
        };

        if expired {
            debug!("Cache entry is expired for {} key", key);
            self.remove_entry(key);
            self.stats.record_expiration();
            self.stats.record_miss();
            return false;
        }

        self.lru.touch(key);
        self.stats.record_hit();
        true
    }

    // == Peek Valid ==
    /// Freshness check with no side effects on recency, stats or storage.
    pub fn peek_valid(&self, key: &CacheKey) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    // == Add ==
    /// Stores `value` under `key` unless the method is not cacheable or the
    /// directives forbid storage.
    ///
    /// Overwrites reset the TTL. Returns whether the value was stored.
    pub fn add(
        &mut self,
        key: CacheKey,
        value: V,
        directives: &CacheDirectives,
        default_max_age: Duration,
    ) -> bool {
        if !self.is_cacheable(&key, directives) {
            debug!("Response for {} key is not cacheable", key);
            self.stats.record_rejection();
            return false;
        }

        let entry = CacheEntry::new(value, directives.ttl(default_max_age));
        self.lru.touch(&key);
        self.entries.insert(key, entry);

        // Capacity can only be exceeded by the entry just inserted
        if self.entries.len() > self.capacity {
            if let Some(evicted) = self.lru.evict_oldest() {
                debug!("Evicted least recently used {} key", evicted);
                self.entries.remove(&evicted);
                self.stats.record_eviction();
            }
        }

        true
    }

    // == Get ==
    /// Returns the stored value and marks the key most recently used.
    ///
    /// Does not check freshness; callers check `has_valid_entry` first.
    pub fn get(&mut self, key: &CacheKey) -> Result<V> {
        match self.entries.get(key) {
            Some(entry) => {
                debug!("Get entry from cache for {} key", key);
                let value = entry.value.clone();
                self.lru.touch(key);
                Ok(value)
            }
            None => Err(CacheError::NotFound(key.to_string())),
        }
    }

    // == Delete ==
    /// Removes an entry if present.
    pub fn delete(&mut self, key: &CacheKey) {
        if self.remove_entry(key) {
            debug!("Deleted entry from cache for {} key", key);
        }
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let expired: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_entry(key);
            self.stats.record_expiration();
        }

        expired.len()
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.entries.len();
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    fn is_cacheable(&self, key: &CacheKey, directives: &CacheDirectives) -> bool {
        self.cacheable_methods.contains(key.method()) && !directives.forbids_storage()
    }

    fn remove_entry(&mut self, key: &CacheKey) -> bool {
        self.lru.remove(key);
        self.entries.remove(key).is_some()
    }
}
