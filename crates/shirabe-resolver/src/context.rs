//! # Resolver Context
//!
//! Owns everything a resolution needs: configuration, the provider (with its
//! HTTP client and credential), the result cache and the filename parser.
//! One context is shared by every worker thread of a run.

use std::path::Path;
use std::sync::Arc;

use shirabe_core::{
    Candidate, DirectId, EpisodeContext, MediaKind, MediaParser, ParsedName, Query, ResolvedMedia,
    is_trivial_query,
};

use crate::cache::{CacheKey, CachedResolution, CachingTransport, EpisodeCache, ResultCache};
use crate::client::HttpTransport;
use crate::config::ResolverConfig;
use crate::disambiguate::{Disambiguation, Outcome, Selection};
use crate::episodes::complete_episode;
use crate::error::{ResolveError, Result};
use crate::orchestrator::{Orchestrator, Stage, swallow};
use crate::provider::{MetadataProvider, TmdbProvider};

/// What to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    /// Title text as given by the caller.
    pub query: String,
    /// Catalogue to search.
    pub kind: MediaKind,
    /// Caller-supplied year; beats a year embedded in the query.
    pub year: Option<u16>,
    /// Take the top candidate instead of asking.
    pub auto_select: bool,
    /// Skip title search and look this record up directly.
    pub direct_id: Option<DirectId>,
    /// Name of the directory holding the file, used by late fallbacks.
    pub parent_dir: Option<String>,
    /// Season/episode information to apply to a resolved show.
    pub episode: Option<EpisodeContext>,
}

impl ResolveRequest {
    fn new(query: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            query: query.into(),
            kind,
            year: None,
            auto_select: false,
            direct_id: None,
            parent_dir: None,
            episode: None,
        }
    }

    /// A movie lookup.
    pub fn movie(query: impl Into<String>) -> Self {
        Self::new(query, MediaKind::Movie)
    }

    /// A show lookup.
    pub fn show(query: impl Into<String>) -> Self {
        Self::new(query, MediaKind::Tv)
    }

    pub fn with_year(mut self, year: Option<u16>) -> Self {
        self.year = year;
        self
    }

    pub fn with_auto_select(mut self, auto_select: bool) -> Self {
        self.auto_select = auto_select;
        self
    }

    pub fn with_direct_id(mut self, id: DirectId) -> Self {
        self.direct_id = Some(id);
        self
    }

    pub fn with_parent_dir(mut self, dir: impl Into<String>) -> Self {
        self.parent_dir = Some(dir.into());
        self
    }

    pub fn with_episode(mut self, episode: EpisodeContext) -> Self {
        self.episode = Some(episode);
        self
    }
}

/// Process-wide resolution state, passed by reference into every call.
pub struct ResolverContext {
    config: ResolverConfig,
    provider: Arc<dyn MetadataProvider>,
    cache: ResultCache,
    episodes: EpisodeCache,
    parser: MediaParser,
}

impl ResolverContext {
    /// Builds a context talking to TMDB over HTTP.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::Credential` when no API key is configured and
    /// `ResolveError::Http` when the HTTP client cannot be built.
    pub fn new(config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        let transport = CachingTransport::new(HttpTransport::new(&config)?);
        let provider = TmdbProvider::new(transport, &config)?;
        Self::with_provider(config, Arc::new(provider))
    }

    /// Builds a context around an existing provider.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::Core` if the filename parser cannot be built.
    pub fn with_provider(config: ResolverConfig, provider: Arc<dyn MetadataProvider>) -> Result<Self> {
        Ok(Self {
            config,
            provider,
            cache: ResultCache::new(),
            episodes: EpisodeCache::new(),
            parser: MediaParser::with_defaults()?,
        })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// ISO locale sent with every provider call.
    pub fn locale(&self) -> &str {
        self.config.locale()
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn parser(&self) -> &MediaParser {
        &self.parser
    }

    /// Checks the credential with the provider.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::Credential` when the key is rejected.
    pub fn verify_credential(&self) -> Result<()> {
        self.provider.verify_credential().map_err(ResolveError::from)
    }

    /// Resolves a movie title.
    ///
    /// # Errors
    ///
    /// Fails only on credential errors; see [`resolve`](Self::resolve).
    pub fn resolve_movie(
        &self,
        query: &str,
        year: Option<u16>,
        auto_select: bool,
        direct_id: Option<DirectId>,
    ) -> Result<Outcome> {
        let mut request = ResolveRequest::movie(query)
            .with_year(year)
            .with_auto_select(auto_select);
        request.direct_id = direct_id;
        self.resolve(request)
    }

    /// Resolves a show title, applying `episode` to the result.
    ///
    /// Without `episode`, season and episode markers are parsed from `query`.
    ///
    /// # Errors
    ///
    /// Fails only on credential errors; see [`resolve`](Self::resolve).
    pub fn resolve_show(
        &self,
        query: &str,
        year: Option<u16>,
        auto_select: bool,
        direct_id: Option<DirectId>,
        episode: Option<EpisodeContext>,
    ) -> Result<Outcome> {
        let mut request = ResolveRequest::show(query)
            .with_year(year)
            .with_auto_select(auto_select);
        request.direct_id = direct_id;
        request.episode = episode;
        self.resolve(request)
    }

    /// Resolves a media file by name.
    ///
    /// Names the anime parser recognizes become show lookups with the parsed
    /// episode; anything else is looked up as a movie.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::Core` for an empty name, and credential errors.
    pub fn resolve_file(
        &self,
        filename: &str,
        parent_dir: Option<&str>,
        auto_select: bool,
    ) -> Result<Outcome> {
        let name = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(filename);

        let request = match self.parser.parse(name)? {
            ParsedName::Show(parsed) => {
                let year = self.parser.normalizer().normalize(name).1;
                ResolveRequest::show(parsed.show_name.clone())
                    .with_year(year)
                    .with_episode(parsed.episode_context())
            }
            ParsedName::Movie(query) => ResolveRequest::movie(query.cleaned()).with_year(query.year()),
        };
        tracing::debug!(file = name, kind = %request.kind, query = %request.query, "classified file");

        let mut request = request.with_auto_select(auto_select);
        request.parent_dir = parent_dir.map(str::to_string);
        self.resolve(request)
    }

    /// Runs the cache lookup and, on a miss, the search cascade.
    ///
    /// Unresolved queries come back as [`Outcome::Unresolved`] holding the
    /// caller's text; several plausible candidates without `auto_select`
    /// come back as [`Outcome::NeedsDisambiguation`].
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::Credential` when the provider rejects the key.
    /// Every other provider failure is absorbed by the cascade.
    pub fn resolve(&self, request: ResolveRequest) -> Result<Outcome> {
        let original = request.query.trim().to_string();
        let request = self.prepare(request);
        let query = self
            .parser
            .normalizer()
            .query(&request.query, request.kind)
            .with_year(request.year)
            .with_direct_id(request.direct_id.clone());
        let key = self.cache_key(&query);

        if query.direct_id().is_none() && is_trivial_query(query.raw()) {
            tracing::debug!(query = %original, "query too short to search");
            self.cache.insert(key, CachedResolution::Unresolved(original.clone()));
            return Ok(Outcome::Unresolved(original));
        }

        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(query = key.query(), year = ?query.year(), "cache hit");
            return Ok(match hit {
                CachedResolution::Resolved(media) => {
                    Outcome::Resolved(self.with_episode(&media, &request))
                }
                CachedResolution::Unresolved(_) => Outcome::Unresolved(original),
            });
        }

        let mut orchestrator = Orchestrator::new(
            self.provider.as_ref(),
            self.parser.normalizer(),
            self.config.scrape_fallback,
        );
        let hit = match orchestrator.run(&request, &query)? {
            Some(hit) if !hit.candidates.is_empty() => hit,
            _ => {
                tracing::warn!(query = %original, kind = %query.kind(), year = ?query.year(), "no match, returning query unchanged");
                self.cache.insert(key, CachedResolution::Unresolved(original.clone()));
                return Ok(Outcome::Unresolved(original));
            }
        };

        let decisive =
            hit.stage == Stage::DirectId || request.auto_select || hit.candidates.len() == 1;
        if decisive {
            if let Some(top) = hit.candidates.first().cloned() {
                return self.finish(&request, &query, hit.stage, top.candidate);
            }
        }

        tracing::info!(
            query = %original,
            stage = %hit.stage,
            candidates = hit.candidates.len(),
            "several candidates, awaiting selection"
        );
        Ok(Outcome::NeedsDisambiguation(Disambiguation::new(
            request, query, hit.stage, hit.candidates,
        )))
    }

    /// Continues a paused resolution with the caller's answer.
    ///
    /// An out-of-range pick, or a new search that finds nothing, hands the
    /// same disambiguation back.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::Credential` when the provider rejects the key.
    pub fn resume(&self, pending: Disambiguation, selection: Selection) -> Result<Outcome> {
        let index = match selection {
            Selection::Default => 0,
            Selection::Pick(n) => n.wrapping_sub(1),
            Selection::Search(text) => return self.research(pending, &text),
        };

        let Some(chosen) = pending.choices().get(index) else {
            tracing::debug!(index, "selection out of range");
            return Ok(Outcome::NeedsDisambiguation(pending));
        };
        let candidate = chosen.candidate.clone();
        self.finish(pending.request(), pending.query(), pending.stage(), candidate)
    }

    fn research(&self, pending: Disambiguation, text: &str) -> Result<Outcome> {
        let mut orchestrator = Orchestrator::new(
            self.provider.as_ref(),
            self.parser.normalizer(),
            self.config.scrape_fallback,
        );
        match orchestrator.research(pending.query().kind(), text, pending.query().year())? {
            Some(hit) => Ok(Outcome::NeedsDisambiguation(
                pending.with_candidates(hit.stage, hit.candidates),
            )),
            None => {
                tracing::info!(query = text, "nothing found, keeping previous candidates");
                Ok(Outcome::NeedsDisambiguation(pending))
            }
        }
    }

    /// Completes the show/movie identity, caches it and applies the episode.
    fn finish(
        &self,
        request: &ResolveRequest,
        query: &Query,
        stage: Stage,
        candidate: Candidate,
    ) -> Result<Outcome> {
        let kind = query.kind();
        let mut media = ResolvedMedia::from_candidate(kind, &candidate);
        media.is_anime_genre = swallow(stage, self.provider.is_anime(kind, media.provider_id))?
            .unwrap_or(false);
        media.external_ids = swallow(stage, self.provider.external_ids(kind, media.provider_id))?
            .unwrap_or_default();

        tracing::info!(
            %stage,
            %kind,
            id = media.provider_id,
            name = %media.canonical_name,
            year = ?media.year,
            anime = media.is_anime_genre,
            "resolved"
        );
        self.cache
            .insert(self.cache_key(query), CachedResolution::Resolved(media.clone()));
        Ok(Outcome::Resolved(self.with_episode(&media, request)))
    }

    fn with_episode(&self, media: &ResolvedMedia, request: &ResolveRequest) -> ResolvedMedia {
        let Some(ref parsed) = request.episode else {
            return media.clone();
        };
        if media.kind != MediaKind::Tv {
            return media.clone();
        }

        let completed = match self.episodes.get(media.provider_id, parsed) {
            Some(completed) => completed,
            None => {
                let completed = complete_episode(self.provider.as_ref(), media, parsed);
                self.episodes
                    .insert(media.provider_id, parsed.clone(), completed.clone());
                completed
            }
        };
        media.with_episode(&completed)
    }

    /// Splits season/episode markers off a show query that came without them.
    fn prepare(&self, mut request: ResolveRequest) -> ResolveRequest {
        if request.kind != MediaKind::Tv || request.episode.is_some() {
            return request;
        }
        let Some(parsed) = self.parser.anime().parse(&request.query) else {
            return request;
        };
        if is_trivial_query(&parsed.show_name) {
            return request;
        }

        tracing::debug!(query = %request.query, %parsed, "episode markers in show query");
        if request.year.is_none() {
            request.year = self.parser.normalizer().normalize(&request.query).1;
        }
        request.episode = Some(parsed.episode_context());
        request.query = parsed.show_name;
        request
    }

    fn cache_key(&self, query: &Query) -> CacheKey {
        let text = self.parser.normalizer().provider_query(query.cleaned());
        let text = match query.direct_id() {
            Some(id) => format!("{id} {text}"),
            None => text,
        };
        CacheKey::new(&text, query.year(), self.locale(), query.kind())
    }
}

impl std::fmt::Debug for ResolverContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverContext")
            .field("config", &self.config)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}
