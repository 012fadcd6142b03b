//! Client Module
//!
//! Request orchestration on top of the response cache, plus the transport
//! seam and its `reqwest` implementation.
//!
//! # Entry Points
//! - `CachedClient::request` - any method, with parameters and timeouts
//! - `get`, `head`, `post`, `put`, `patch`, `delete` - verb shortcuts

mod cached_client;
mod fetcher;
mod request;
mod response;

pub use cached_client::CachedClient;
pub use fetcher::{Fetcher, ReqwestFetcher};
pub use request::RequestSpec;
pub use response::CachedResponse;
