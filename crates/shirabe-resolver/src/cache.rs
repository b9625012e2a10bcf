//! # Caches
//!
//! Process-lifetime memo tables:
//!
//! - [`CachingTransport`] memoizes successful GET responses (JSON and HTML)
//!   per endpoint and parameter set, so repeated detail lookups for the same
//!   record hit the network once.
//! - [`ResultCache`] memoizes whole resolutions per [`CacheKey`], including
//!   confirmed negatives.
//! - [`EpisodeCache`] memoizes the episode details completed for a show, so
//!   a cached show does not go back to the provider for the same episode.
//!
//! Both use `parking_lot` locks held only for the map operation itself; no
//! lock is held across a provider call. Two threads racing on the same key
//! may both fetch, and the later write wins with an identical value.

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use shirabe_core::{EpisodeContext, MediaKind, ResolvedMedia};

use crate::client::{Params, Transport};
use crate::error::ProviderResult;

/// Memoizing wrapper around another [`Transport`].
///
/// Errors are never cached.
#[derive(Debug)]
pub struct CachingTransport<T> {
    inner: T,
    responses: Mutex<HashMap<String, Value>>,
    pages: Mutex<HashMap<String, String>>,
}

impl<T: Transport> CachingTransport<T> {
    /// Wraps `inner`.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            responses: Mutex::new(HashMap::new()),
            pages: Mutex::new(HashMap::new()),
        }
    }

    /// Number of memoized responses.
    pub fn len(&self) -> usize {
        self.responses.lock().len() + self.pages.lock().len()
    }

    /// Whether nothing has been memoized yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Transport> Transport for CachingTransport<T> {
    fn get_json(&self, endpoint: &str, params: &Params<'_>) -> ProviderResult<Value> {
        let key = request_key(endpoint, params);
        if let Some(hit) = self.responses.lock().get(&key) {
            tracing::trace!(endpoint, "request cache hit");
            return Ok(hit.clone());
        }

        let value = self.inner.get_json(endpoint, params)?;
        self.responses.lock().insert(key, value.clone());
        Ok(value)
    }

    fn get_text(&self, url: &str, params: &Params<'_>) -> ProviderResult<String> {
        let key = request_key(url, params);
        if let Some(hit) = self.pages.lock().get(&key) {
            tracing::trace!(url, "page cache hit");
            return Ok(hit.clone());
        }

        let page = self.inner.get_text(url, params)?;
        self.pages.lock().insert(key, page.clone());
        Ok(page)
    }
}

/// `endpoint?k=v&...` with parameters sorted, so order does not matter.
fn request_key(endpoint: &str, params: &Params<'_>) -> String {
    let mut pairs: Vec<String> = params
        .iter()
        .filter(|(k, _)| *k != "api_key")
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    pairs.sort_unstable();
    format!("{endpoint}?{}", pairs.join("&"))
}

/// Identity of one resolution: normalized query, year, locale and kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    query: String,
    year: Option<u16>,
    locale: String,
    kind: MediaKind,
}

impl CacheKey {
    /// Builds a key; the query is trimmed and lower-cased.
    pub fn new(query: &str, year: Option<u16>, locale: &str, kind: MediaKind) -> Self {
        Self {
            query: query.trim().to_lowercase(),
            year,
            locale: locale.to_string(),
            kind,
        }
    }

    /// The normalized query text.
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// A finished resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedResolution {
    /// A confirmed match (show-level identity for TV).
    Resolved(ResolvedMedia),
    /// Every stage was tried and failed; holds the text handed back to the caller.
    Unresolved(String),
}

/// Thread-safe memo table for finished resolutions.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: RwLock<HashMap<CacheKey, CachedResolution>>,
}

impl ResultCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a finished resolution.
    pub fn get(&self, key: &CacheKey) -> Option<CachedResolution> {
        self.entries.read().get(key).cloned()
    }

    /// Records a finished resolution. Last writer wins.
    pub fn insert(&self, key: CacheKey, value: CachedResolution) {
        tracing::trace!(query = key.query(), "caching resolution");
        self.entries.write().insert(key, value);
    }

    /// Number of cached resolutions.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

/// Episode details completed for a show, keyed by show id and the episode
/// context the filename produced. Provider failures are memoized as the
/// partially filled context they left behind.
#[derive(Debug, Default)]
pub struct EpisodeCache {
    entries: RwLock<HashMap<(u64, EpisodeContext), EpisodeContext>>,
}

impl EpisodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, show_id: u64, parsed: &EpisodeContext) -> Option<EpisodeContext> {
        self.entries.read().get(&(show_id, parsed.clone())).cloned()
    }

    pub fn insert(&self, show_id: u64, parsed: EpisodeContext, completed: EpisodeContext) {
        self.entries.write().insert((show_id, parsed), completed);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
