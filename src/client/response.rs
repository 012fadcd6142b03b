//! Response model stored in the cache
//!
//! A fully read response: status, headers and body bytes.

use std::borrow::Cow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::cache::HeaderLookup;

/// A response whose body has been read to completion.
///
/// Header names are stored lower-case, so lookups ignore case. Repeated
/// headers are joined with `", "`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl CachedResponse {
    pub fn new<I, K, V>(status: u16, headers: I, body: impl Into<Vec<u8>>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut merged: HashMap<String, String> = HashMap::new();
        for (name, value) in headers {
            let value: String = value.into();
            // Repeated field lines form one comma separated list
            match merged.entry(name.as_ref().to_ascii_lowercase()) {
                Entry::Occupied(existing) => {
                    let existing = existing.into_mut();
                    existing.push_str(", ");
                    existing.push_str(&value);
                }
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
            }
        }

        Self {
            status,
            headers: merged,
            body: body.into(),
        }
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl HeaderLookup for CachedResponse {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        CachedResponse::header(self, name).map(Cow::Borrowed)
    }
}
