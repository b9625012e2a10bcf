//! # Metadata Provider
//!
//! [`MetadataProvider`] is the seam between the search cascade and the
//! outside world. [`TmdbProvider`] implements it over any [`Transport`],
//! wrapping every call in the configured [`RetryPolicy`].

use serde_json::Value;
use shirabe_core::{Candidate, DirectId, ExternalIds, MediaKind};

use crate::client::Transport;
use crate::config::ResolverConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::retry::RetryPolicy;
use crate::scrape::SearchPageParser;

/// Longest episode title kept before truncating at a word boundary.
pub const MAX_EPISODE_TITLE_LEN: usize = 60;

/// Episode count of one season.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonSummary {
    /// Season number; `0` holds specials.
    pub number: u32,
    /// Episodes in the season.
    pub episode_count: u32,
}

/// Operations the resolver needs from a metadata provider.
pub trait MetadataProvider: Send + Sync {
    /// Title search. `year` narrows by release / first-air year.
    fn search(&self, kind: MediaKind, query: &str, year: Option<u16>)
    -> ProviderResult<Vec<Candidate>>;

    /// Full record for a known ID.
    fn details(&self, kind: MediaKind, id: u64) -> ProviderResult<Candidate>;

    /// Provider ID for an IMDb or TVDB ID, if the provider knows it.
    fn find_by_external(&self, kind: MediaKind, id: &DirectId) -> ProviderResult<Option<u64>>;

    /// IMDb / TVDB cross-references for a record.
    fn external_ids(&self, kind: MediaKind, id: u64) -> ProviderResult<ExternalIds>;

    /// Anime classification from title, genres, language and keywords.
    fn is_anime(&self, kind: MediaKind, id: u64) -> ProviderResult<bool>;

    /// Seasons of a show.
    fn seasons(&self, id: u64) -> ProviderResult<Vec<SeasonSummary>>;

    /// Episode name, truncated to [`MAX_EPISODE_TITLE_LEN`].
    fn episode_title(&self, id: u64, season: u32, episode: u32) -> ProviderResult<Option<String>>;

    /// First result of the website search page, if any.
    fn scrape_search(&self, kind: MediaKind, query: &str) -> ProviderResult<Option<u64>>;

    /// Checks that the provider accepts our credential.
    fn verify_credential(&self) -> ProviderResult<()> {
        Ok(())
    }
}

/// TMDB v3 implementation of [`MetadataProvider`].
#[derive(Debug)]
pub struct TmdbProvider<T> {
    transport: T,
    locale: String,
    site_base_url: String,
    retry: RetryPolicy,
    pages: SearchPageParser,
}

impl<T: Transport> TmdbProvider<T> {
    /// Creates a provider over `transport` using the locale, site URL and
    /// retry policy from `config`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Scrape` if the search page patterns fail to compile.
    pub fn new(transport: T, config: &ResolverConfig) -> ProviderResult<Self> {
        Ok(Self {
            transport,
            locale: config.locale().to_string(),
            site_base_url: config.site_base_url.clone(),
            retry: config.retry,
            pages: SearchPageParser::new()?,
        })
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn get(&self, endpoint: &str, params: &[(&str, String)]) -> ProviderResult<Value> {
        self.retry
            .run(endpoint, || self.transport.get_json(endpoint, params))
    }

    fn localized(&self) -> Vec<(&'static str, String)> {
        vec![("language", self.locale.clone())]
    }

    fn keywords(&self, kind: MediaKind, id: u64) -> ProviderResult<Vec<String>> {
        let body = self.get(&format!("/{}/{id}/keywords", kind.path_segment()), &[])?;
        // Movies list keywords under `keywords`, shows under `results`.
        let list_key = match kind {
            MediaKind::Movie => "keywords",
            MediaKind::Tv => "results",
        };
        Ok(body
            .get(list_key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|k| k.get("name").and_then(Value::as_str))
                    .map(str::to_lowercase)
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl<T: Transport> MetadataProvider for TmdbProvider<T> {
    fn search(
        &self,
        kind: MediaKind,
        query: &str,
        year: Option<u16>,
    ) -> ProviderResult<Vec<Candidate>> {
        let mut params = self.localized();
        params.push(("query", query.to_string()));
        if let Some(year) = year {
            let year_param = match kind {
                MediaKind::Movie => "primary_release_year",
                MediaKind::Tv => "first_air_date_year",
            };
            params.push((year_param, year.to_string()));
        }

        let body = self.get(&format!("/search/{}", kind.path_segment()), &params)?;
        let results = body
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::Malformed("search response has no results".into()))?;
        Ok(results.iter().filter_map(Candidate::from_payload).collect())
    }

    fn details(&self, kind: MediaKind, id: u64) -> ProviderResult<Candidate> {
        let body = self.get(
            &format!("/{}/{id}", kind.path_segment()),
            &self.localized(),
        )?;
        Candidate::from_payload(&body)
            .ok_or_else(|| ProviderError::Malformed(format!("{kind} {id} has no id or title")))
    }

    fn find_by_external(&self, kind: MediaKind, id: &DirectId) -> ProviderResult<Option<u64>> {
        let (external, source) = match (id, id.external_source()) {
            (DirectId::Provider(native), _) => return Ok(Some(*native)),
            (DirectId::Imdb(imdb), Some(source)) => (imdb.clone(), source),
            (DirectId::Tvdb(tvdb), Some(source)) => (tvdb.to_string(), source),
            _ => return Ok(None),
        };

        let body = self.get(
            &format!("/find/{external}"),
            &[("external_source", source.to_string())],
        )?;
        let list_key = match kind {
            MediaKind::Movie => "movie_results",
            MediaKind::Tv => "tv_results",
        };
        Ok(body
            .get(list_key)
            .and_then(Value::as_array)
            .and_then(|r| r.first())
            .and_then(|first| first.get("id"))
            .and_then(Value::as_u64))
    }

    fn external_ids(&self, kind: MediaKind, id: u64) -> ProviderResult<ExternalIds> {
        let body = self.get(&format!("/{}/{id}/external_ids", kind.path_segment()), &[])?;
        Ok(ExternalIds {
            imdb_id: body
                .get("imdb_id")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            tvdb_id: body.get("tvdb_id").and_then(Value::as_u64),
        })
    }

    fn is_anime(&self, kind: MediaKind, id: u64) -> ProviderResult<bool> {
        let details = self.details(kind, id)?;
        if details.display_name.to_lowercase().contains("anime") {
            return Ok(true);
        }

        let payload = &details.payload;
        let animation = payload
            .get("genres")
            .and_then(Value::as_array)
            .is_some_and(|genres| {
                genres
                    .iter()
                    .filter_map(|g| g.get("name").and_then(Value::as_str))
                    .any(|name| name.eq_ignore_ascii_case("animation"))
            });
        let japanese = payload.get("original_language").and_then(Value::as_str) == Some("ja");
        if animation && japanese {
            return Ok(true);
        }

        let keywords = self.keywords(kind, id)?;
        let anime_keyword = match kind {
            MediaKind::Movie => keywords
                .iter()
                .any(|k| k == "anime" || k == "japanese animation"),
            MediaKind::Tv => keywords.iter().any(|k| k.contains("anime")),
        };
        Ok(anime_keyword)
    }

    fn seasons(&self, id: u64) -> ProviderResult<Vec<SeasonSummary>> {
        let body = self.get(&format!("/tv/{id}"), &self.localized())?;
        let seasons = body
            .get("seasons")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|s| {
                        Some(SeasonSummary {
                            number: u32::try_from(s.get("season_number")?.as_u64()?).ok()?,
                            episode_count: u32::try_from(s.get("episode_count")?.as_u64()?)
                                .ok()?,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(seasons)
    }

    fn episode_title(&self, id: u64, season: u32, episode: u32) -> ProviderResult<Option<String>> {
        let body = self.get(
            &format!("/tv/{id}/season/{season}/episode/{episode}"),
            &self.localized(),
        )?;
        Ok(body
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| truncate_title(n, MAX_EPISODE_TITLE_LEN)))
    }

    fn scrape_search(&self, kind: MediaKind, query: &str) -> ProviderResult<Option<u64>> {
        let url = SearchPageParser::search_url(&self.site_base_url, kind);
        let params = [("query", query.to_string())];
        let html = self
            .retry
            .run("scrape", || self.transport.get_text(&url, &params))
            .map_err(|e| match e {
                ProviderError::Credential => ProviderError::Credential,
                other => ProviderError::Scrape(other.to_string()),
            })?;
        Ok(self.pages.first_result(&html, kind))
    }

    fn verify_credential(&self) -> ProviderResult<()> {
        self.get("/configuration", &[]).map(|_| ())
    }
}

/// Cuts `title` to at most `max` characters at the last word boundary and
/// appends `...`.
pub fn truncate_title(title: &str, max: usize) -> String {
    if title.chars().count() <= max {
        return title.to_string();
    }
    let cut: String = title.chars().take(max).collect();
    let head = match cut.rfind(' ') {
        Some(space) if space > 0 => &cut[..space],
        _ => cut.as_str(),
    };
    format!("{}...", head.trim_end())
}
