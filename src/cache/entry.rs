//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// A stored response with its freshness metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When the entry was stored
    pub created_at: Instant,
    /// Freshness lifetime from `max-age` or the configured default
    pub max_age: Duration,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry stamped with the current time.
    pub fn new(value: V, max_age: Duration) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            max_age,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once `now >= created_at + max_age`,
    /// so a zero `max_age` is never served. Compared as elapsed time, so a
    /// `max_age` past the clock's range means the entry never expires.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= self.max_age
    }

    // == Time To Live ==
    /// Remaining freshness, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.max_age
            .saturating_sub(Instant::now().saturating_duration_since(self.created_at))
    }
}
