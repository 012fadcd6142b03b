//! Cache Key Module
//!
//! Identifies a cached response by request method, canonical URL and an
//! optional parameter set.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use reqwest::Url;

// == Cache Key ==
/// Immutable identity of a cacheable request.
///
/// Parameters are sorted at construction and reduced to a digest once, so
/// two keys built from the same parameters in any order compare equal and
/// hash identically. Equality still compares the full parameter list; the
/// digest only speeds up hashing and the common mismatch case.
#[derive(Debug, Clone)]
pub struct CacheKey {
    method: String,
    url: String,
    params: Option<Vec<(String, String)>>,
    digest: u64,
}

impl CacheKey {
    // == Constructors ==
    /// Creates a key from a method and URL.
    pub fn new(method: impl AsRef<str>, url: impl AsRef<str>) -> Self {
        Self::build(method.as_ref(), url.as_ref(), None)
    }

    /// Creates a key that also covers a parameter set.
    pub fn with_params<I, K, V>(method: impl AsRef<str>, url: impl AsRef<str>, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params: Vec<(String, String)> = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        params.sort();
        // An empty parameter set is the same request as no parameter set
        let params = Some(params).filter(|p| !p.is_empty());
        Self::build(method.as_ref(), url.as_ref(), params)
    }

    fn build(method: &str, url: &str, params: Option<Vec<(String, String)>>) -> Self {
        let method = method.trim().to_ascii_uppercase();
        let url = canonicalize_url(url);

        let mut hasher = DefaultHasher::new();
        method.hash(&mut hasher);
        url.hash(&mut hasher);
        params.hash(&mut hasher);

        Self {
            method,
            url,
            params,
            digest: hasher.finish(),
        }
    }

    // == Accessors ==
    /// Upper-cased request method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Canonical URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sorted parameters, if the key covers a parameter set.
    pub fn params(&self) -> Option<&[(String, String)]> {
        self.params.as_deref()
    }

    pub fn digest(&self) -> u64 {
        self.digest
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
            && self.method == other.method
            && self.url == other.url
            && self.params == other.params
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.digest);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)?;
        if let Some(params) = &self.params {
            write!(f, " [{} params, {:016x}]", params.len(), self.digest)?;
        }
        Ok(())
    }
}

/// Normalizes scheme/host case and an empty path and drops the fragment,
/// which never reaches the origin. Unparsable input is kept verbatim.
fn canonicalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => trimmed.to_string(),
    }
}
