//! Cache-Control Directive Module
//!
//! Parses the subset of `Cache-Control` this cache honors: `no-cache`,
//! `no-store` and `max-age`. Everything else is ignored.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tracing::debug;

/// Header field carrying the caching directives
pub const CACHE_CONTROL: &str = "cache-control";

// == Header Lookup ==
/// Read access to a response's headers by field name.
///
/// Implementations must match names case-insensitively and return repeated
/// field lines as one comma separated value.
pub trait HeaderLookup {
    fn header(&self, name: &str) -> Option<Cow<'_, str>>;
}

impl HeaderLookup for HashMap<String, String> {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name)
            .or_else(|| self.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v))
            .map(|v| Cow::Borrowed(v.as_str()))
    }
}

impl HeaderLookup for BTreeMap<String, String> {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name)
            .or_else(|| self.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v))
            .map(|v| Cow::Borrowed(v.as_str()))
    }
}

impl HeaderLookup for [(&str, &str)] {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        join_values(
            self.iter()
                .filter(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| *v),
        )
    }
}

impl<const N: usize> HeaderLookup for [(&str, &str); N] {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.as_slice().header(name)
    }
}

impl HeaderLookup for reqwest::header::HeaderMap {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        // HeaderMap names are already case-insensitive
        join_values(self.get_all(name).iter().filter_map(|v| v.to_str().ok()))
    }
}

/// Borrows a single value; joins several with `", "`.
fn join_values<'a>(mut values: impl Iterator<Item = &'a str>) -> Option<Cow<'a, str>> {
    let first = values.next()?;
    match values.next() {
        None => Some(Cow::Borrowed(first)),
        Some(second) => {
            let mut joined = format!("{}, {}", first, second);
            for value in values {
                joined.push_str(", ");
                joined.push_str(value);
            }
            Some(Cow::Owned(joined))
        }
    }
}

// == Directives ==
/// The caching directives of one response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheDirectives {
    pub no_cache: bool,
    pub no_store: bool,
    /// `max-age` in seconds, when present and well formed
    pub max_age: Option<u64>,
}

impl CacheDirectives {
    /// Parses a raw `Cache-Control` value. Never fails; malformed tokens are dropped.
    pub fn parse(value: &str) -> Self {
        let mut directives = Self::default();

        for token in value.split(',') {
            let token = token.trim().to_ascii_lowercase();
            match token.as_str() {
                "" => {}
                "no-cache" => directives.no_cache = true,
                "no-store" => directives.no_store = true,
                _ => {
                    if let Some((name, raw)) = token.split_once('=') {
                        if name.trim() == "max-age" {
                            match raw.trim().trim_matches('"').parse::<u64>() {
                                Ok(seconds) => directives.max_age = Some(seconds),
                                Err(_) => debug!("Ignoring malformed max-age directive: {}", token),
                            }
                        }
                    }
                }
            }
        }

        directives
    }

    /// Looks up `Cache-Control` in any header store and parses it.
    ///
    /// A missing header yields the empty directive set.
    pub fn from_headers<H: HeaderLookup + ?Sized>(headers: &H) -> Self {
        ["cache-control", "Cache-Control", "CACHE-CONTROL"]
            .iter()
            .find_map(|name| headers.header(name))
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    /// True when the response opted out of caching.
    ///
    /// `no-cache` is treated like `no-store`: such responses are never stored
    /// rather than stored and revalidated.
    pub fn forbids_storage(&self) -> bool {
        self.no_cache || self.no_store
    }

    /// Effective TTL, falling back to `default` without a `max-age`.
    pub fn ttl(&self, default: Duration) -> Duration {
        self.max_age.map(Duration::from_secs).unwrap_or(default)
    }
}
