//! Cached Client
//!
//! Orchestrates one request through the cache: wait for any in-flight fetch
//! of the same key, serve a fresh hit, or fetch once and offer the result
//! for storage.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheKey, Registration, ResponseCache};
use crate::client::{CachedResponse, Fetcher, ReqwestFetcher, RequestSpec};
use crate::config::CacheConfig;
use crate::error::Result;

/// Releases a held pending slot when dropped unless disarmed.
///
/// Covers the error and cancellation exits of a fetch.
struct PendingSlot<'a> {
    cache: &'a ResponseCache<CachedResponse>,
    key: &'a CacheKey,
    armed: bool,
}

impl<'a> PendingSlot<'a> {
    fn new(cache: &'a ResponseCache<CachedResponse>, key: &'a CacheKey) -> Self {
        Self {
            cache,
            key,
            armed: true,
        }
    }

    /// The slot was released by `ResponseCache::add`.
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!("Releasing {} key after failed or cancelled fetch", self.key);
            self.cache.release(self.key);
        }
    }
}

// == Cached Client ==
/// HTTP client front-end that serves repeated requests from a shared cache.
#[derive(Debug, Clone)]
pub struct CachedClient<F = ReqwestFetcher> {
    cache: Arc<ResponseCache<CachedResponse>>,
    fetcher: F,
}

impl CachedClient<ReqwestFetcher> {
    /// Creates a client with a fresh cache and a default `reqwest` transport.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        Ok(Self::with_fetcher(
            Arc::new(ResponseCache::new(config)?),
            ReqwestFetcher::default(),
        ))
    }
}

impl<F: Fetcher> CachedClient<F> {
    /// Creates a client over an existing (possibly shared) cache.
    pub fn with_fetcher(cache: Arc<ResponseCache<CachedResponse>>, fetcher: F) -> Self {
        Self { cache, fetcher }
    }

    pub fn cache(&self) -> &Arc<ResponseCache<CachedResponse>> {
        &self.cache
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    // == Request ==
    /// Serves `request` from the cache or fetches it, with at most one
    /// in-flight fetch per key across all callers sharing the cache.
    pub async fn request(&self, request: RequestSpec) -> Result<Arc<CachedResponse>> {
        let key = request.key();

        loop {
            let registration = match request.wait_timeout {
                Some(timeout) => self.cache.register_with_timeout(&key, timeout).await?,
                None => self.cache.register(&key).await?,
            };

            match registration {
                Registration::Cached => {
                    if let Some(response) = self.cache.lookup(&key) {
                        debug!("Cache hit for {} key", key);
                        return Ok(response);
                    }
                    // Expired between registration and lookup; compete again
                }
                Registration::Acquired => {
                    let slot = PendingSlot::new(&self.cache, &key);

                    if let Some(response) = self.cache.lookup(&key) {
                        return Ok(response);
                    }

                    debug!("Cache miss for {} key, fetching", key);
                    let response = Arc::new(self.fetcher.fetch(&request).await?);
                    self.cache.add(&key, Arc::clone(&response), &*response);
                    slot.disarm();
                    return Ok(response);
                }
            }
        }
    }

    // == Verb Helpers ==
    pub async fn get(&self, url: impl Into<String>) -> Result<Arc<CachedResponse>> {
        self.request(RequestSpec::new("GET", url)).await
    }

    pub async fn head(&self, url: impl Into<String>) -> Result<Arc<CachedResponse>> {
        self.request(RequestSpec::new("HEAD", url)).await
    }

    pub async fn post(
        &self,
        url: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Result<Arc<CachedResponse>> {
        self.request(RequestSpec::new("POST", url).body(body)).await
    }

    pub async fn put(
        &self,
        url: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Result<Arc<CachedResponse>> {
        self.request(RequestSpec::new("PUT", url).body(body)).await
    }

    pub async fn patch(
        &self,
        url: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Result<Arc<CachedResponse>> {
        self.request(RequestSpec::new("PATCH", url).body(body)).await
    }

    pub async fn delete(&self, url: impl Into<String>) -> Result<Arc<CachedResponse>> {
        self.request(RequestSpec::new("DELETE", url)).await
    }

    /// Drops every cached response.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
