//! # Search Orchestrator
//!
//! Walks an ordered list of search strategies until one produces candidates:
//!
//! 1. direct ID lookup (short-circuits everything else)
//! 2. query + year, primary threshold
//! 3. extracted title
//! 4. website search page
//! 5. query without its year
//! 6. normalizer output, when it differs from the query
//! 7. parent directory name
//! 8. parent directory (or query) truncated to 4, then 2 words
//!
//! Stages 3 onwards use the broad threshold. Every stage swallows provider
//! errors and falls through, except credential failures, which abort the
//! whole resolution. The same `(query, year)` pair is never searched twice
//! within one run.

use std::collections::HashSet;
use std::fmt;

use shirabe_core::scoring::{self, BROAD_THRESHOLD, PRIMARY_THRESHOLD};
use shirabe_core::{
    Candidate, DirectId, MediaKind, Query, QueryNormalizer, ScoredCandidate, is_trivial_query,
};

use crate::context::ResolveRequest;
use crate::error::{ProviderError, ProviderResult, ResolveError, Result};
use crate::provider::MetadataProvider;

/// Word counts tried by the last-resort truncation stage.
const TRUNCATIONS: [(Stage, usize); 2] = [(Stage::Truncated4, 4), (Stage::Truncated2, 2)];

/// A step of the fallback cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    DirectId,
    Primary,
    ExtractedTitle,
    Scrape,
    WithoutYear,
    CleanedQuery,
    ParentDir,
    Truncated4,
    Truncated2,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DirectId => "direct-id",
            Self::Primary => "primary",
            Self::ExtractedTitle => "extracted-title",
            Self::Scrape => "scrape",
            Self::WithoutYear => "without-year",
            Self::CleanedQuery => "cleaned-query",
            Self::ParentDir => "parent-dir",
            Self::Truncated4 => "truncated-4",
            Self::Truncated2 => "truncated-2",
        };
        f.write_str(name)
    }
}

/// Candidates produced by the first stage that fired.
#[derive(Debug, Clone, PartialEq)]
pub struct StageHit {
    /// The stage that produced the candidates.
    pub stage: Stage,
    /// Candidates, best first. Never empty.
    pub candidates: Vec<ScoredCandidate>,
}

/// One run of the cascade. Borrowed from the resolver context per resolution.
pub(crate) struct Orchestrator<'a> {
    provider: &'a dyn MetadataProvider,
    normalizer: &'a QueryNormalizer,
    scrape_fallback: bool,
    tried: HashSet<(String, Option<u16>)>,
}

impl<'a> Orchestrator<'a> {
    pub(crate) fn new(
        provider: &'a dyn MetadataProvider,
        normalizer: &'a QueryNormalizer,
        scrape_fallback: bool,
    ) -> Self {
        Self {
            provider,
            normalizer,
            scrape_fallback,
            tried: HashSet::new(),
        }
    }

    /// Runs the cascade for `query`; `None` means every stage came up empty.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::Credential` as soon as any provider call
    /// reports a credential failure.
    pub(crate) fn run(&mut self, request: &ResolveRequest, query: &Query) -> Result<Option<StageHit>> {
        let kind = query.kind();
        let raw = query.raw();
        let year = query.year();

        if let Some(id) = query.direct_id() {
            if let Some(candidate) = self.direct(kind, id)? {
                tracing::debug!(stage = %Stage::DirectId, %id, "direct lookup succeeded");
                let scored = ScoredCandidate {
                    score: scoring::score(&candidate, query.cleaned(), year),
                    candidate,
                };
                return Ok(Some(StageHit {
                    stage: Stage::DirectId,
                    candidates: vec![scored],
                }));
            }
            tracing::debug!(stage = %Stage::DirectId, %id, "direct lookup failed, falling back to search");
        }

        if let Some(hit) = self.search(Stage::Primary, kind, raw, year, PRIMARY_THRESHOLD)? {
            return Ok(Some(hit));
        }

        let extracted = self.normalizer.extract_title(raw);
        if let Some(hit) = self.search(Stage::ExtractedTitle, kind, &extracted, year, BROAD_THRESHOLD)? {
            return Ok(Some(hit));
        }

        if self.scrape_fallback {
            if let Some(hit) = self.scrape(kind, &extracted, year)? {
                return Ok(Some(hit));
            }
        }

        if year.is_some() {
            let without = self.normalizer.strip_trailing_parenthetical(raw);
            if let Some(hit) = self.search(Stage::WithoutYear, kind, &without, None, BROAD_THRESHOLD)? {
                return Ok(Some(hit));
            }
        }

        if query.cleaned() != raw {
            if let Some(hit) =
                self.search(Stage::CleanedQuery, kind, query.cleaned(), year, BROAD_THRESHOLD)?
            {
                return Ok(Some(hit));
            }
        }

        if let Some(ref dir) = request.parent_dir {
            let (dir_title, dir_year) = self.normalizer.normalize(dir);
            if let Some(hit) =
                self.search(Stage::ParentDir, kind, &dir_title, year.or(dir_year), BROAD_THRESHOLD)?
            {
                return Ok(Some(hit));
            }
        }

        let source = request.parent_dir.as_deref().unwrap_or(raw);
        for (stage, words) in TRUNCATIONS {
            let truncated = self.normalizer.aggressive_clean(source, words);
            if let Some(hit) = self.search(stage, kind, &truncated, None, BROAD_THRESHOLD)? {
                return Ok(Some(hit));
            }
        }

        Ok(None)
    }

    /// Fresh search for a replacement query typed during disambiguation:
    /// with the year, without it, then the extracted title.
    pub(crate) fn research(
        &mut self,
        kind: MediaKind,
        text: &str,
        year: Option<u16>,
    ) -> Result<Option<StageHit>> {
        if year.is_some() {
            if let Some(hit) = self.search(Stage::Primary, kind, text, year, PRIMARY_THRESHOLD)? {
                return Ok(Some(hit));
            }
        }
        if let Some(hit) = self.search(Stage::WithoutYear, kind, text, None, BROAD_THRESHOLD)? {
            return Ok(Some(hit));
        }
        let extracted = self.normalizer.extract_title(text);
        self.search(Stage::ExtractedTitle, kind, &extracted, None, BROAD_THRESHOLD)
    }

    fn direct(&self, kind: MediaKind, id: &DirectId) -> Result<Option<Candidate>> {
        let provider_id = match id {
            DirectId::Provider(n) => Some(*n),
            external => swallow(Stage::DirectId, self.provider.find_by_external(kind, external))?
                .flatten(),
        };
        let Some(provider_id) = provider_id else {
            return Ok(None);
        };
        swallow(Stage::DirectId, self.provider.details(kind, provider_id))
    }

    fn search(
        &mut self,
        stage: Stage,
        kind: MediaKind,
        text: &str,
        year: Option<u16>,
        threshold: i32,
    ) -> Result<Option<StageHit>> {
        let q = self.normalizer.provider_query(text);
        if is_trivial_query(&q) {
            tracing::trace!(%stage, "nothing left to search");
            return Ok(None);
        }
        if !self.tried.insert((q.clone(), year)) {
            tracing::trace!(%stage, query = %q, ?year, "already searched");
            return Ok(None);
        }

        tracing::debug!(%stage, %kind, query = %q, ?year, "searching");
        let Some(results) = swallow(stage, self.provider.search(kind, &q, year))? else {
            return Ok(None);
        };

        let candidates = scoring::select(&results, &q, year, threshold);
        if candidates.is_empty() {
            return Ok(None);
        }
        Ok(Some(StageHit { stage, candidates }))
    }

    fn scrape(&mut self, kind: MediaKind, title: &str, year: Option<u16>) -> Result<Option<StageHit>> {
        let q = self
            .normalizer
            .provider_query(&self.normalizer.remove_genre_names(title));
        if is_trivial_query(&q) {
            return Ok(None);
        }

        tracing::debug!(stage = %Stage::Scrape, %kind, query = %q, "trying website search");
        let Some(Some(id)) = swallow(Stage::Scrape, self.provider.scrape_search(kind, &q))? else {
            return Ok(None);
        };
        let Some(candidate) = swallow(Stage::Scrape, self.provider.details(kind, id))? else {
            return Ok(None);
        };
        Ok(Some(StageHit {
            stage: Stage::Scrape,
            candidates: scoring::rank(&[candidate], &q, year),
        }))
    }
}

/// Turns a provider failure into "no result for this stage", except
/// credential failures, which end the resolution.
pub(crate) fn swallow<T>(stage: Stage, result: ProviderResult<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ProviderError::Credential) => {
            tracing::error!(%stage, "provider rejected the API key");
            Err(ResolveError::Credential)
        }
        Err(err) => {
            tracing::warn!(%stage, error = %err, "provider call failed, continuing");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeProvider, record};

    fn normalizer() -> QueryNormalizer {
        QueryNormalizer::new().unwrap()
    }

    fn run(provider: &FakeProvider, request: &ResolveRequest) -> Result<Option<StageHit>> {
        let n = normalizer();
        let query = n
            .query(&request.query, request.kind)
            .with_year(request.year)
            .with_direct_id(request.direct_id.clone());
        Orchestrator::new(provider, &n, true).run(request, &query)
    }

    #[test]
    fn primary_stage_fires_first() {
        let provider =
            FakeProvider::new().with_search(MediaKind::Movie, "the matrix", vec![record(603, "The Matrix", "1999-03-30")]);
        let hit = run(&provider, &ResolveRequest::movie("The Matrix").with_year(Some(1999)))
            .unwrap()
            .unwrap();
        assert_eq!(hit.stage, Stage::Primary);
        assert_eq!(hit.candidates[0].candidate.provider_id, 603);
        assert_eq!(provider.searched(), vec![("the matrix".to_string(), Some(1999))]);
    }

    #[test]
    fn earlier_stages_run_once_before_scrape_fires() {
        let provider = FakeProvider::new()
            .with_scrape(MediaKind::Tv, "obscure show", 4242)
            .with_record(MediaKind::Tv, record(4242, "Obscure Show", "2011-01-01"));
        let hit = run(&provider, &ResolveRequest::show("Obscure Show 1080p"))
            .unwrap()
            .unwrap();

        assert_eq!(hit.stage, Stage::Scrape);
        assert_eq!(hit.candidates[0].candidate.provider_id, 4242);
        assert_eq!(
            provider.searched(),
            vec![
                ("obscure show 1080p".to_string(), None),
                ("obscure show".to_string(), None),
            ]
        );
        assert_eq!(provider.calls().scrape, 1);
    }

    #[test]
    fn exhausted_cascade_tries_every_distinct_query_once() {
        let provider = FakeProvider::new();
        let request = ResolveRequest::movie("Some Film (2004)").with_parent_dir("Some Film Collection");
        assert_eq!(run(&provider, &request).unwrap(), None);

        let searched = provider.searched();
        let unique: HashSet<_> = searched.iter().cloned().collect();
        assert_eq!(unique.len(), searched.len());
        assert_eq!(searched[0], ("some film (2004)".to_string(), Some(2004)));
        assert!(searched.contains(&("some film".to_string(), None)));
        assert!(searched.contains(&("some film collection".to_string(), Some(2004))));
    }

    #[test]
    fn direct_id_short_circuits() {
        let provider = FakeProvider::new().with_record(MediaKind::Tv, record(1399, "Game of Thrones", "2011-04-17"));
        let request = ResolveRequest::show("whatever").with_direct_id(DirectId::Provider(1399));
        let hit = run(&provider, &request).unwrap().unwrap();
        assert_eq!(hit.stage, Stage::DirectId);
        assert_eq!(hit.candidates.len(), 1);
        assert!(provider.searched().is_empty());
    }

    #[test]
    fn external_id_uses_cross_reference() {
        let provider = FakeProvider::new()
            .with_external(DirectId::Imdb("tt0944947".into()), 1399)
            .with_record(MediaKind::Tv, record(1399, "Game of Thrones", "2011-04-17"));
        let request = ResolveRequest::show("got").with_direct_id(DirectId::Imdb("tt0944947".into()));
        let hit = run(&provider, &request).unwrap().unwrap();
        assert_eq!(hit.candidates[0].candidate.display_name, "Game of Thrones");
        assert_eq!(provider.calls().find, 1);
    }

    #[test]
    fn unknown_direct_id_falls_back_to_search() {
        let provider =
            FakeProvider::new().with_search(MediaKind::Tv, "dark", vec![record(70523, "Dark", "2017-12-01")]);
        let request = ResolveRequest::show("Dark").with_direct_id(DirectId::Tvdb(1));
        let hit = run(&provider, &request).unwrap().unwrap();
        assert_eq!(hit.stage, Stage::Primary);
    }

    #[test]
    fn transient_failure_falls_through() {
        let provider = FakeProvider::new()
            .failing("sherlock 2010")
            .with_search(MediaKind::Tv, "sherlock", vec![record(19885, "Sherlock", "2010-07-25")]);
        let hit = run(&provider, &ResolveRequest::show("Sherlock 2010")).unwrap().unwrap();
        assert_eq!(hit.stage, Stage::ExtractedTitle);
        assert_eq!(hit.candidates[0].candidate.provider_id, 19885);
    }

    #[test]
    fn credential_failure_aborts() {
        let provider = FakeProvider::new().rejecting_credential();
        let err = run(&provider, &ResolveRequest::show("Dark")).unwrap_err();
        assert!(matches!(err, ResolveError::Credential));
        assert_eq!(provider.searched().len(), 1);
    }

    #[test]
    fn research_drops_year_then_extracts_title() {
        let provider =
            FakeProvider::new().with_search(MediaKind::Tv, "dark", vec![record(70523, "Dark", "2017-12-01")]);
        let n = normalizer();
        let mut orchestrator = Orchestrator::new(&provider, &n, false);
        let hit = orchestrator
            .research(MediaKind::Tv, "Dark", Some(2005))
            .unwrap()
            .unwrap();
        assert_eq!(hit.stage, Stage::WithoutYear);
        assert_eq!(
            provider.searched(),
            vec![("dark".to_string(), Some(2005)), ("dark".to_string(), None)]
        );
    }

    #[test]
    fn stage_names() {
        assert_eq!(Stage::Truncated4.to_string(), "truncated-4");
        assert_eq!(Stage::DirectId.to_string(), "direct-id");
    }
}
