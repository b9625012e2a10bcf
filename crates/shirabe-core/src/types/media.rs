use std::fmt;

use serde::{Deserialize, Serialize};

/// Which provider catalogue a query is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Feature film.
    Movie,
    /// Television show (including anime series).
    Tv,
}

impl MediaKind {
    /// Path segment used by the provider for this kind (`movie` / `tv`).
    #[must_use]
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// An identifier supplied by the caller that bypasses title search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectId {
    /// Native provider (TMDB) numeric ID.
    Provider(u64),
    /// IMDb ID such as `tt0944947`; needs a provider-side cross-reference.
    Imdb(String),
    /// TVDB numeric ID; needs a provider-side cross-reference.
    Tvdb(u64),
}

impl DirectId {
    /// Name of the provider's `external_source` parameter, or `None` for
    /// native IDs.
    #[must_use]
    pub fn external_source(&self) -> Option<&'static str> {
        match self {
            Self::Provider(_) => None,
            Self::Imdb(_) => Some("imdb_id"),
            Self::Tvdb(_) => Some("tvdb_id"),
        }
    }
}

impl fmt::Display for DirectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider(id) => write!(f, "tmdb-{id}"),
            Self::Imdb(id) => write!(f, "imdb-{id}"),
            Self::Tvdb(id) => write!(f, "tvdb-{id}"),
        }
    }
}

/// Cross-reference IDs attached to a resolved record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIds {
    /// IMDb ID, if the provider knows one.
    pub imdb_id: Option<String>,
    /// TVDB ID, if the provider knows one.
    pub tvdb_id: Option<u64>,
}

/// A single resolution attempt's input.
///
/// Built once (normally through [`QueryNormalizer::query`](crate::parser::QueryNormalizer::query))
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    raw: String,
    cleaned: String,
    year: Option<u16>,
    direct_id: Option<DirectId>,
    kind: MediaKind,
}

impl Query {
    /// Creates a query from its raw text and the normalizer's output.
    #[must_use]
    pub fn new(
        raw: impl Into<String>,
        cleaned: impl Into<String>,
        year: Option<u16>,
        kind: MediaKind,
    ) -> Self {
        Self {
            raw: raw.into(),
            cleaned: cleaned.into(),
            year,
            direct_id: None,
            kind,
        }
    }

    /// Attaches a direct ID.
    #[must_use]
    pub fn with_direct_id(mut self, id: Option<DirectId>) -> Self {
        self.direct_id = id;
        self
    }

    /// Overrides the year (a caller-supplied year beats an embedded one).
    #[must_use]
    pub fn with_year(mut self, year: Option<u16>) -> Self {
        if year.is_some() {
            self.year = year;
        }
        self
    }

    /// The text exactly as given by the caller.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The normalizer's cleaned text.
    #[must_use]
    pub fn cleaned(&self) -> &str {
        &self.cleaned
    }

    /// Release/air year, if known.
    #[must_use]
    pub fn year(&self) -> Option<u16> {
        self.year
    }

    /// Direct ID, if supplied.
    #[must_use]
    pub fn direct_id(&self) -> Option<&DirectId> {
        self.direct_id.as_ref()
    }

    /// Movie or TV.
    #[must_use]
    pub fn kind(&self) -> MediaKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_path_segments() {
        assert_eq!(MediaKind::Movie.path_segment(), "movie");
        assert_eq!(MediaKind::Tv.to_string(), "tv");
    }

    #[test]
    fn direct_id_external_source() {
        assert_eq!(DirectId::Provider(1).external_source(), None);
        assert_eq!(DirectId::Imdb("tt1".into()).external_source(), Some("imdb_id"));
        assert_eq!(DirectId::Tvdb(5).external_source(), Some("tvdb_id"));
        assert_eq!(DirectId::Imdb("tt1".into()).to_string(), "imdb-tt1");
    }

    #[test]
    fn caller_year_overrides_embedded_year() {
        let q = Query::new("Heat (1995)", "Heat", Some(1995), MediaKind::Movie);
        assert_eq!(q.clone().with_year(None).year(), Some(1995));
        assert_eq!(q.with_year(Some(1996)).year(), Some(1996));
    }
}
