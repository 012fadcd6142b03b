//! Error types for the response cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the response cache.
///
/// Malformed `Cache-Control` directives never show up here: the directive
/// parser absorbs them and simply leaves the directive out.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// `get` was called for a key with no stored entry
    #[error("No cache entry for {0}")]
    NotFound(String),

    /// Waited too long for another caller's in-flight fetch of the same key
    #[error("Timeout exceeded waiting for {0}")]
    Timeout(String),

    /// The underlying fetch failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration values failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the response cache.
pub type Result<T> = std::result::Result<T, CacheError>;
