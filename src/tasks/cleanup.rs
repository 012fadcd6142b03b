//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries, so
//! memory is reclaimed for keys nobody asks for again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ResponseCache;
use crate::config::CacheConfig;

/// Spawns a background task that periodically sweeps expired entries.
///
/// Lazy purging on access still applies; this only bounds how long a stale
/// entry can occupy a slot. The store lock is held for one sweep at a time.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(ResponseCache::<CachedResponse>::default());
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(30));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<V>(cache: Arc<ResponseCache<V>>, interval: Duration) -> JoinHandle<()>
where
    V: Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!("Starting TTL cleanup task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup_expired();
            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}

/// Spawns the sweeper when `config` sets a cleanup interval.
///
/// Returns `None` when `cleanup_interval` is unset, leaving expiry to lazy
/// purging alone.
pub fn spawn_cleanup_task_from_config<V>(
    cache: Arc<ResponseCache<V>>,
    config: &CacheConfig,
) -> Option<JoinHandle<()>>
where
    V: Send + Sync + 'static,
{
    match config.cleanup_interval() {
        Some(interval) => Some(spawn_cleanup_task(cache, interval)),
        None => {
            debug!("No cleanup interval configured, TTL cleanup task not started");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheKey;
    use std::collections::HashMap;

    fn headers(cache_control: &str) -> HashMap<String, String> {
        HashMap::from([("cache-control".to_string(), cache_control.to_string())])
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_removes_expired_entries() {
        let cache = Arc::new(ResponseCache::<String>::default());
        let key = CacheKey::new("GET", "https://example.com/short");
        cache.add(&key, "value".to_string(), &headers("max-age=1"));

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(2_500)).await;

        // Removed without anyone touching the key
        assert!(cache.is_empty());
        assert_eq!(cache.stats().expirations, 1);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_preserves_valid_entries() {
        let cache = Arc::new(ResponseCache::<String>::default());
        let key = CacheKey::new("GET", "https://example.com/long");
        cache.add(&key, "value".to_string(), &headers("max-age=3600"));

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(1_500)).await;

        assert_eq!(cache.get(&key).unwrap().as_str(), "value");

        handle.abort();
    }

    #[tokio::test]
    async fn test_no_interval_spawns_nothing() {
        let cache = Arc::new(ResponseCache::<String>::default());
        let config = CacheConfig::default();

        assert!(spawn_cleanup_task_from_config(cache, &config).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_interval_sweeps_expired_entries() {
        let config = CacheConfig {
            cleanup_interval: Some(1),
            ..CacheConfig::default()
        };
        let cache = Arc::new(ResponseCache::<String>::new(&config).unwrap());
        cache.add(
            &CacheKey::new("GET", "https://example.com/short"),
            "value".to_string(),
            &headers("max-age=1"),
        );

        let handle = spawn_cleanup_task_from_config(cache.clone(), &config).unwrap();

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert!(cache.is_empty());
        assert_eq!(cache.stats().expirations, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let cache = Arc::new(ResponseCache::<String>::default());

        let handle = spawn_cleanup_task(cache, Duration::from_secs(1));
        handle.abort();

        let result = handle.await;
        assert!(result.unwrap_err().is_cancelled());
    }
}
