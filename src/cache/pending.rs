//! Stampede Guard Module
//!
//! Tracks keys with a fetch in flight so concurrent callers for the same key
//! wait for one fetch instead of repeating it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cache::CacheKey;
use crate::error::{CacheError, Result};

/// Longest wait honored by `register`; larger timeouts are clamped to it.
pub const MAX_WAIT_TIMEOUT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

// == Registration ==
/// Outcome of a successful `register`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The caller holds the pending slot and must release it
    Acquired,
    /// A fresh entry already exists; nothing was registered
    Cached,
}

// == Stampede Guard ==
/// Set of keys with an in-flight fetch.
///
/// Each pending key owns a `watch::Sender`. Waiters subscribe while holding
/// the lock, and `release` drops the sender, which wakes every subscriber at
/// once. A waiter that subscribed before the release cannot miss it.
#[derive(Debug, Default)]
pub struct StampedeGuard {
    pending: Mutex<HashMap<CacheKey, watch::Sender<()>>>,
}

impl StampedeGuard {
    pub fn new() -> Self {
        Self::default()
    }

    // == Register ==
    /// Claims the pending slot for `key`, waiting while another caller holds it.
    ///
    /// `is_cached` runs under the guard's lock once the key is free; when it
    /// reports a fresh entry nothing is registered. Wake-ups are event driven;
    /// `recheck` only caps how long a waiter sleeps between re-checks.
    /// Fails with `Timeout` after `timeout` (at most `MAX_WAIT_TIMEOUT`)
    /// without ever holding the slot.
    /// Dropping the returned future while it waits leaves no state behind.
    pub async fn register<F>(
        &self,
        key: &CacheKey,
        timeout: Duration,
        recheck: Duration,
        is_cached: F,
    ) -> Result<Registration>
    where
        F: Fn() -> bool,
    {
        let deadline = Instant::now() + timeout.min(MAX_WAIT_TIMEOUT);

        loop {
            let mut released = {
                let mut pending = self.lock();
                match pending.get(key) {
                    Some(sender) => sender.subscribe(),
                    None => {
                        if is_cached() {
                            return Ok(Registration::Cached);
                        }
                        pending.insert(key.clone(), watch::channel(()).0);
                        debug!("Registered pending fetch for {} key", key);
                        return Ok(Registration::Acquired);
                    }
                }
            };

            let now = Instant::now();
            if now >= deadline {
                warn!("Timeout exceeded waiting for {} key", key);
                return Err(CacheError::Timeout(key.to_string()));
            }

            debug!("Waiting for in-flight fetch of {} key", key);
            let wake_at = deadline.min(now + recheck.min(MAX_WAIT_TIMEOUT));
            // Err from changed() means the sender was dropped, i.e. released
            let _ = tokio::time::timeout_at(wake_at, released.changed()).await;
        }
    }

    // == Release ==
    /// Frees the pending slot for `key`. Idempotent; never fails.
    pub fn release(&self, key: &CacheKey) {
        if self.lock().remove(key).is_some() {
            debug!("Released pending fetch for {} key", key);
        }
    }

    pub fn is_pending(&self, key: &CacheKey) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, watch::Sender<()>>> {
        // The map stays consistent even if a holder panicked
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio_test::{assert_pending, assert_ready, task};

    const LONG: Duration = Duration::from_secs(300);
    const RECHECK: Duration = Duration::from_millis(100);

    fn key() -> CacheKey {
        CacheKey::new("GET", "https://example.com/slow")
    }

    #[tokio::test]
    async fn test_register_absent_key_acquires() {
        let guard = StampedeGuard::new();

        let reg = guard.register(&key(), LONG, RECHECK, || false).await.unwrap();
        assert_eq!(reg, Registration::Acquired);
        assert!(guard.is_pending(&key()));
    }

    #[tokio::test]
    async fn test_register_cached_key_does_not_register() {
        let guard = StampedeGuard::new();

        let reg = guard.register(&key(), LONG, RECHECK, || true).await.unwrap();
        assert_eq!(reg, Registration::Cached);
        assert!(guard.is_empty());
    }

    #[tokio::test]
    async fn test_second_register_waits_until_release() {
        let guard = StampedeGuard::new();
        guard.register(&key(), LONG, RECHECK, || false).await.unwrap();

        let k = key();
        let mut waiter = task::spawn(guard.register(&k, LONG, RECHECK, || false));
        assert_pending!(waiter.poll());

        guard.release(&key());
        assert!(waiter.is_woken());
        // The waiter finds the slot free and becomes the next fetcher
        let reg = assert_ready!(waiter.poll()).unwrap();
        assert_eq!(reg, Registration::Acquired);
    }

    #[tokio::test]
    async fn test_waiter_sees_result_landed_by_winner() {
        let guard = StampedeGuard::new();
        guard.register(&key(), LONG, RECHECK, || false).await.unwrap();

        let k = key();
        let mut waiter = task::spawn(guard.register(&k, LONG, RECHECK, || true));
        assert_pending!(waiter.poll());

        guard.release(&key());
        let reg = assert_ready!(waiter.poll()).unwrap();
        assert_eq!(reg, Registration::Cached);
        assert!(guard.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_times_out_when_never_released() {
        let guard = StampedeGuard::new();
        guard.register(&key(), LONG, RECHECK, || false).await.unwrap();

        let started = Instant::now();
        let result = guard
            .register(&key(), Duration::from_secs(5), RECHECK, || false)
            .await;

        assert!(matches!(result, Err(CacheError::Timeout(_))));
        assert!(started.elapsed() >= Duration::from_secs(5));
        // The original holder still owns the slot
        assert!(guard.is_pending(&key()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_registrations_single_winner() {
        let guard = Arc::new(StampedeGuard::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let guard = Arc::clone(&guard);
            handles.push(tokio::spawn(async move {
                guard
                    .register(&key(), Duration::from_secs(1), RECHECK, || false)
                    .await
            }));
        }

        let mut acquired = 0;
        let mut timed_out = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(Registration::Acquired) => acquired += 1,
                Err(CacheError::Timeout(_)) => timed_out += 1,
                other => panic!("unexpected outcome: {:?}", other),
            }
        }

        assert_eq!(acquired, 1);
        assert_eq!(timed_out, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_timeout_is_clamped_not_overflowed() {
        let guard = StampedeGuard::new();
        guard.register(&key(), LONG, RECHECK, || false).await.unwrap();

        let k = key();
        let mut waiter = task::spawn(guard.register(&k, Duration::MAX, Duration::MAX, || false));
        assert_pending!(waiter.poll());

        guard.release(&key());
        let reg = assert_ready!(waiter.poll()).unwrap();
        assert_eq!(reg, Registration::Acquired);
    }

    #[test]
    fn test_release_is_idempotent() {
        let guard = StampedeGuard::new();

        guard.release(&key());
        guard.release(&key());
        assert!(guard.is_empty());
    }

    #[tokio::test]
    async fn test_release_twice_then_register_again() {
        let guard = StampedeGuard::new();

        guard.register(&key(), LONG, RECHECK, || false).await.unwrap();
        guard.release(&key());
        guard.release(&key());

        let reg = guard.register(&key(), LONG, RECHECK, || false).await.unwrap();
        assert_eq!(reg, Registration::Acquired);
        assert_eq!(guard.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_leaves_no_state() {
        let guard = StampedeGuard::new();
        guard.register(&key(), LONG, RECHECK, || false).await.unwrap();

        let k = key();
        let mut waiter = task::spawn(guard.register(&k, LONG, RECHECK, || false));
        assert_pending!(waiter.poll());
        drop(waiter);

        assert_eq!(guard.len(), 1);
        guard.release(&key());
        assert!(guard.is_empty());
    }
}
