//! Cache Statistics Module
//!
//! Tracks cache effectiveness: hits, misses, evictions and expirations.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Validity checks and reads that found a fresh entry
    pub hits: u64,
    /// Validity checks that found nothing usable
    pub misses: u64,
    /// Entries dropped by the LRU policy
    pub evictions: u64,
    /// Entries dropped because their TTL elapsed
    pub expirations: u64,
    /// Responses not stored because of method or directives
    pub rejected: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Keys with a fetch currently in flight
    pub pending: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub fn record_rejection(&mut self) {
        self.rejected += 1;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats, CacheStats::default());
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_counters() {
        let mut stats = CacheStats::new();
        stats.record_eviction();
        stats.record_expiration();
        stats.record_expiration();
        stats.record_rejection();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.expirations, 2);
        assert_eq!(stats.rejected, 1);
    }

    #[test]
    fn test_stats_serialize() {
        let json = serde_json::to_value(CacheStats::new()).unwrap();
        assert_eq!(json["hits"], 0);
        assert_eq!(json["pending"], 0);
    }
}
