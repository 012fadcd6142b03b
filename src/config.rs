//! Configuration Module
//!
//! Cache tuning knobs. Built in code, deserialized from a host application's
//! config file, or loaded from environment variables.

use std::collections::HashSet;
use std::env;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{CacheError, Result};

/// Default TTL in seconds for responses without a `max-age` directive
pub const DEFAULT_MAX_AGE: u64 = 120;
/// Default ceiling in seconds for waiting on another caller's fetch
pub const DEFAULT_WAIT_TIMEOUT: u64 = 300;
/// Default re-check interval in milliseconds while waiting
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
/// Default maximum number of stored responses
pub const DEFAULT_CAPACITY: usize = 100;
/// Methods whose responses are cached unless configured otherwise
pub const DEFAULT_CACHEABLE_METHODS: [&str; 2] = ["HEAD", "GET"];

/// Response cache configuration.
///
/// Durations are kept as plain integers so the struct deserializes from any
/// serde format without custom adapters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL in seconds applied when a response carries no `max-age`
    pub max_age: u64,
    /// Seconds a caller waits for an in-flight fetch before timing out
    pub wait_timeout: u64,
    /// Upper bound in milliseconds between pending-state re-checks
    pub poll_interval_ms: u64,
    /// Request methods eligible for caching (compared upper-case)
    pub cacheable_methods: Vec<String>,
    /// Maximum number of stored responses
    pub capacity: usize,
    /// Interval in seconds for the background expiry sweeper, if spawned
    pub cleanup_interval: Option<u64>,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `RESPONSE_CACHE_MAX_AGE` - Default TTL in seconds (default: 120)
    /// - `RESPONSE_CACHE_WAIT_TIMEOUT` - Wait ceiling in seconds (default: 300)
    /// - `RESPONSE_CACHE_POLL_INTERVAL_MS` - Re-check interval (default: 100)
    /// - `RESPONSE_CACHE_CACHEABLE_METHODS` - Comma separated (default: HEAD,GET)
    /// - `RESPONSE_CACHE_CAPACITY` - Maximum entries (default: 100)
    /// - `RESPONSE_CACHE_CLEANUP_INTERVAL` - Sweeper interval in seconds (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_age: parse_var("RESPONSE_CACHE_MAX_AGE").unwrap_or(defaults.max_age),
            wait_timeout: parse_var("RESPONSE_CACHE_WAIT_TIMEOUT")
                .unwrap_or(defaults.wait_timeout),
            poll_interval_ms: parse_var("RESPONSE_CACHE_POLL_INTERVAL_MS")
                .unwrap_or(defaults.poll_interval_ms),
            cacheable_methods: env::var("RESPONSE_CACHE_CACHEABLE_METHODS")
                .ok()
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|m| !m.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or(defaults.cacheable_methods),
            capacity: parse_var("RESPONSE_CACHE_CAPACITY").unwrap_or(defaults.capacity),
            cleanup_interval: parse_var("RESPONSE_CACHE_CLEANUP_INTERVAL"),
        }
    }

    /// Checks that the values can drive a working cache.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "capacity must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(CacheError::InvalidConfig(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.cacheable_methods.is_empty() {
            return Err(CacheError::InvalidConfig(
                "cacheable_methods must not be empty".to_string(),
            ));
        }
        if self.cleanup_interval == Some(0) {
            return Err(CacheError::InvalidConfig(
                "cleanup_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn default_max_age(&self) -> Duration {
        Duration::from_secs(self.max_age)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Sweep interval for the background cleanup task, if one is configured.
    pub fn cleanup_interval(&self) -> Option<Duration> {
        self.cleanup_interval.map(Duration::from_secs)
    }

    /// Upper-cased method allowlist.
    pub fn method_set(&self) -> HashSet<String> {
        self.cacheable_methods
            .iter()
            .map(|m| m.trim().to_ascii_uppercase())
            .collect()
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_MAX_AGE,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            cacheable_methods: DEFAULT_CACHEABLE_METHODS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            capacity: DEFAULT_CAPACITY,
            cleanup_interval: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
