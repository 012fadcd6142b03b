//! Transport seam
//!
//! The cache never performs I/O itself; a `Fetcher` executes real requests.

use std::future::Future;

use reqwest::Method;
use tracing::debug;

use crate::client::{CachedResponse, RequestSpec};
use crate::error::{CacheError, Result};

/// Executes a request and reads the whole response.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, request: &RequestSpec) -> impl Future<Output = Result<CachedResponse>> + Send;
}

// == Reqwest Fetcher ==
/// `Fetcher` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, request: &RequestSpec) -> Result<CachedResponse> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| {
                CacheError::Transport(format!("invalid method {}: {}", request.method, e))
            })?;

        let mut builder = self.client.request(method, &request.url);
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CacheError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| CacheError::Transport(e.to_string()))?;

        debug!("Fetched {} {} -> {}", request.method, request.url, status);
        Ok(CachedResponse::new(status, headers, body.to_vec()))
    }
}
