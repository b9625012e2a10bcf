use serde::{Deserialize, Serialize};

use super::candidate::Candidate;
use super::episode::{EpisodeContext, PaddedNumber};
use super::media::{ExternalIds, MediaKind};

/// Structured output of the anime filename cascade.
///
/// An input to search, never cached on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeParseResult {
    /// Show name with `.`, `_` and `-` separators turned into spaces.
    pub show_name: String,

    /// Season number, when the filename names one.
    pub season_number: Option<PaddedNumber>,

    /// Episode number (the special number for `S##S##` extras).
    pub episode_number: Option<PaddedNumber>,

    /// Episode title suffix (`Show - 03 - The Title`).
    pub episode_title: Option<String>,

    /// Special/OVA/extra content.
    pub is_extra: bool,
}

impl AnimeParseResult {
    /// Creates a result carrying only a show name.
    #[must_use]
    pub fn new(show_name: impl Into<String>) -> Self {
        Self {
            show_name: show_name.into(),
            season_number: None,
            episode_number: None,
            episode_title: None,
            is_extra: false,
        }
    }

    /// The episode-level part of the result.
    #[must_use]
    pub fn episode_context(&self) -> EpisodeContext {
        EpisodeContext {
            season: self.season_number,
            episode: self.episode_number,
            episode_title: self.episode_title.clone(),
            is_extra: self.is_extra,
        }
    }
}

impl std::fmt::Display for AnimeParseResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AnimeParseResult(show={:?}", self.show_name)?;
        if let Some(season) = self.season_number {
            write!(f, ", season={season}")?;
        }
        if let Some(episode) = self.episode_number {
            write!(f, ", ep={episode}")?;
        }
        if self.is_extra {
            write!(f, ", extra")?;
        }
        write!(f, ")")
    }
}

/// Terminal output of a successful resolution. Owned by the caller once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMedia {
    /// Movie or TV.
    pub kind: MediaKind,

    /// Provider record ID.
    pub provider_id: u64,

    /// Provider's canonical title.
    pub canonical_name: String,

    /// Release or first-air year.
    pub year: Option<u16>,

    /// Anime classification from genres, language and keywords.
    pub is_anime_genre: bool,

    /// Season number (shows only).
    pub season_number: Option<PaddedNumber>,

    /// Episode number (shows only).
    pub episode_number: Option<PaddedNumber>,

    /// Episode title (shows only).
    pub episode_title: Option<String>,

    /// Special/OVA/extra content.
    pub is_extra: bool,

    /// Cross-reference IDs.
    pub external_ids: ExternalIds,
}

impl ResolvedMedia {
    /// Creates the show/movie identity for a chosen candidate.
    #[must_use]
    pub fn from_candidate(kind: MediaKind, candidate: &Candidate) -> Self {
        Self {
            kind,
            provider_id: candidate.provider_id,
            canonical_name: candidate.display_name.clone(),
            year: candidate.year(),
            is_anime_genre: false,
            season_number: None,
            episode_number: None,
            episode_title: None,
            is_extra: false,
            external_ids: ExternalIds::default(),
        }
    }

    /// Returns a copy with the episode-level fields taken from `ctx`.
    #[must_use]
    pub fn with_episode(&self, ctx: &EpisodeContext) -> Self {
        Self {
            season_number: ctx.season,
            episode_number: ctx.episode,
            episode_title: ctx.episode_title.clone(),
            is_extra: ctx.is_extra,
            ..self.clone()
        }
    }

    /// Folder-style name: `Title (Year) {tmdb-ID}`.
    #[must_use]
    pub fn proper_name(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({year}) {{tmdb-{}}}", self.canonical_name, self.provider_id),
            None => format!("{} {{tmdb-{}}}", self.canonical_name, self.provider_id),
        }
    }
}

impl std::fmt::Display for ResolvedMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.proper_name())?;
        match (self.season_number, self.episode_number) {
            (Some(s), Some(e)) => write!(f, " S{s}E{e}")?,
            (Some(s), None) => write!(f, " S{s}")?,
            (None, Some(e)) => write!(f, " E{e}")?,
            (None, None) => {}
        }
        if let Some(ref title) = self.episode_title {
            write!(f, " - {title}")?;
        }
        if self.is_anime_genre {
            write!(f, " [anime]")?;
        }
        Ok(())
    }
}
