//! Request description handed to the cache and the transport
//!
//! Defines what the orchestrator needs to key, fetch and time-bound a call.

use std::time::Duration;

use crate::cache::CacheKey;

/// An outgoing request.
///
/// # Fields
/// - `method`: HTTP method, upper-cased on construction
/// - `url`: target URL
/// - `params`: query parameters; part of the cache key
/// - `body`: optional request body; not part of the cache key
/// - `wait_timeout`: overrides the cache's wait ceiling for this call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: String,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub wait_timeout: Option<Duration>,
}

impl RequestSpec {
    pub fn new(method: impl AsRef<str>, url: impl Into<String>) -> Self {
        Self {
            method: method.as_ref().trim().to_ascii_uppercase(),
            url: url.into(),
            params: Vec::new(),
            body: None,
            wait_timeout: None,
        }
    }

    /// Adds a query parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }

    /// The cache identity of this request.
    pub fn key(&self) -> CacheKey {
        CacheKey::with_params(&self.method, &self.url, self.params.iter().cloned())
    }
}
