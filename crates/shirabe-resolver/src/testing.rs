//! In-memory provider for resolver tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde_json::json;
use shirabe_core::{Candidate, DirectId, ExternalIds, MediaKind};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{MetadataProvider, SeasonSummary};

/// A provider record with a show-style payload.
pub(crate) fn record(id: u64, name: &str, date: &str) -> Candidate {
    Candidate::from_payload(&json!({
        "id": id,
        "name": name,
        "first_air_date": date,
        "original_language": "en",
    }))
    .expect("test record is well formed")
}

/// Snapshot of per-method call counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Calls {
    pub search: usize,
    pub details: usize,
    pub find: usize,
    pub external_ids: usize,
    pub is_anime: usize,
    pub seasons: usize,
    pub episode_title: usize,
    pub scrape: usize,
}

impl Calls {
    pub(crate) fn total(&self) -> usize {
        self.search
            + self.details
            + self.find
            + self.external_ids
            + self.is_anime
            + self.seasons
            + self.episode_title
            + self.scrape
    }
}

#[derive(Default)]
struct Counters {
    search: AtomicUsize,
    details: AtomicUsize,
    find: AtomicUsize,
    external_ids: AtomicUsize,
    is_anime: AtomicUsize,
    seasons: AtomicUsize,
    episode_title: AtomicUsize,
    scrape: AtomicUsize,
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

/// Canned search results and records, keyed the way the resolver asks for them.
///
/// Search filters by year the way the real provider does.
#[derive(Default)]
pub(crate) struct FakeProvider {
    searches: HashMap<(MediaKind, String), Vec<Candidate>>,
    records: HashMap<(MediaKind, u64), Candidate>,
    externals: HashMap<DirectId, u64>,
    anime: HashSet<u64>,
    scrapes: HashMap<(MediaKind, String), u64>,
    seasons: HashMap<u64, Vec<SeasonSummary>>,
    titles: HashMap<(u64, u32, u32), String>,
    failing: HashSet<String>,
    reject_credential: bool,
    counters: Counters,
    searched: Mutex<Vec<(String, Option<u16>)>>,
}

impl FakeProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Results for `query`; each result is also registered as a record.
    pub(crate) fn with_search(mut self, kind: MediaKind, query: &str, results: Vec<Candidate>) -> Self {
        for c in &results {
            self.records.insert((kind, c.provider_id), c.clone());
        }
        self.searches.insert((kind, query.to_lowercase()), results);
        self
    }

    pub(crate) fn with_record(mut self, kind: MediaKind, candidate: Candidate) -> Self {
        self.records.insert((kind, candidate.provider_id), candidate);
        self
    }

    pub(crate) fn with_external(mut self, id: DirectId, provider_id: u64) -> Self {
        self.externals.insert(id, provider_id);
        self
    }

    pub(crate) fn with_anime(mut self, id: u64) -> Self {
        self.anime.insert(id);
        self
    }

    pub(crate) fn with_scrape(mut self, kind: MediaKind, query: &str, id: u64) -> Self {
        self.scrapes.insert((kind, query.to_lowercase()), id);
        self
    }

    pub(crate) fn with_seasons(mut self, id: u64, seasons: Vec<SeasonSummary>) -> Self {
        self.seasons.insert(id, seasons);
        self
    }

    pub(crate) fn with_episode_title(mut self, id: u64, season: u32, episode: u32, title: &str) -> Self {
        self.titles.insert((id, season, episode), title.to_string());
        self
    }

    /// Searches for `query` fail with a transient error.
    pub(crate) fn failing(mut self, query: &str) -> Self {
        self.failing.insert(query.to_lowercase());
        self
    }

    /// Every call fails with a credential error.
    pub(crate) fn rejecting_credential(mut self) -> Self {
        self.reject_credential = true;
        self
    }

    pub(crate) fn calls(&self) -> Calls {
        let c = &self.counters;
        Calls {
            search: c.search.load(Ordering::SeqCst),
            details: c.details.load(Ordering::SeqCst),
            find: c.find.load(Ordering::SeqCst),
            external_ids: c.external_ids.load(Ordering::SeqCst),
            is_anime: c.is_anime.load(Ordering::SeqCst),
            seasons: c.seasons.load(Ordering::SeqCst),
            episode_title: c.episode_title.load(Ordering::SeqCst),
            scrape: c.scrape.load(Ordering::SeqCst),
        }
    }

    /// Every `(query, year)` passed to `search`, in order.
    pub(crate) fn searched(&self) -> Vec<(String, Option<u16>)> {
        self.searched.lock().clone()
    }

    fn check_credential(&self) -> ProviderResult<()> {
        if self.reject_credential {
            Err(ProviderError::Credential)
        } else {
            Ok(())
        }
    }
}

impl MetadataProvider for FakeProvider {
    fn search(&self, kind: MediaKind, query: &str, year: Option<u16>) -> ProviderResult<Vec<Candidate>> {
        bump(&self.counters.search);
        self.searched.lock().push((query.to_string(), year));
        self.check_credential()?;

        let key = query.to_lowercase();
        if self.failing.contains(&key) {
            return Err(ProviderError::Transient {
                reason: "connection reset".into(),
            });
        }
        Ok(self
            .searches
            .get(&(kind, key))
            .map(|results| {
                results
                    .iter()
                    .filter(|c| year.is_none() || c.year() == year)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn details(&self, kind: MediaKind, id: u64) -> ProviderResult<Candidate> {
        bump(&self.counters.details);
        self.check_credential()?;
        self.records
            .get(&(kind, id))
            .cloned()
            .ok_or_else(|| ProviderError::Permanent {
                status: 404,
                reason: "Not Found".into(),
            })
    }

    fn find_by_external(&self, _kind: MediaKind, id: &DirectId) -> ProviderResult<Option<u64>> {
        bump(&self.counters.find);
        self.check_credential()?;
        Ok(self.externals.get(id).copied())
    }

    fn external_ids(&self, _kind: MediaKind, id: u64) -> ProviderResult<ExternalIds> {
        bump(&self.counters.external_ids);
        self.check_credential()?;
        Ok(ExternalIds {
            imdb_id: Some(format!("tt{id:07}")),
            tvdb_id: None,
        })
    }

    fn is_anime(&self, _kind: MediaKind, id: u64) -> ProviderResult<bool> {
        bump(&self.counters.is_anime);
        self.check_credential()?;
        Ok(self.anime.contains(&id))
    }

    fn seasons(&self, id: u64) -> ProviderResult<Vec<SeasonSummary>> {
        bump(&self.counters.seasons);
        self.check_credential()?;
        Ok(self.seasons.get(&id).cloned().unwrap_or_default())
    }

    fn episode_title(&self, id: u64, season: u32, episode: u32) -> ProviderResult<Option<String>> {
        bump(&self.counters.episode_title);
        self.check_credential()?;
        Ok(self.titles.get(&(id, season, episode)).cloned())
    }

    fn scrape_search(&self, kind: MediaKind, query: &str) -> ProviderResult<Option<u64>> {
        bump(&self.counters.scrape);
        self.check_credential()?;
        Ok(self.scrapes.get(&(kind, query.to_lowercase())).copied())
    }

    fn verify_credential(&self) -> ProviderResult<()> {
        self.check_credential()
    }
}
