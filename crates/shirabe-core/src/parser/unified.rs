//! # Unified Parser Interface
//!
//! Classifies a raw file or directory name as a show episode or a movie title
//! by running the anime cascade first and falling back to plain normalization.

use crate::error::{Result, ShirabeError};
use crate::parser::anime::AnimeParser;
use crate::parser::normalize::QueryNormalizer;
use crate::types::{AnimeParseResult, MediaKind, Query};

/// Configuration for the parser.
#[derive(Debug, Clone, Default)]
pub struct ParserConfig {
    /// Forces the classification when the caller already knows the kind.
    pub kind_hint: Option<MediaKind>,
}

impl ParserConfig {
    /// Create a new parser configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force movie or show classification.
    pub fn with_kind(mut self, kind: MediaKind) -> Self {
        self.kind_hint = Some(kind);
        self
    }
}

/// What a name was classified as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedName {
    /// A show episode (or a show name with no episode markers).
    Show(AnimeParseResult),
    /// A movie title with an optional year.
    Movie(Query),
}

impl ParsedName {
    /// The title to search for.
    pub fn title(&self) -> &str {
        match self {
            Self::Show(r) => &r.show_name,
            Self::Movie(q) => q.cleaned(),
        }
    }

    /// Media kind of the classification.
    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Show(_) => MediaKind::Tv,
            Self::Movie(_) => MediaKind::Movie,
        }
    }
}

/// Anime cascade plus query normalizer behind one entry point.
#[derive(Debug, Clone)]
pub struct MediaParser {
    config: ParserConfig,
    anime: AnimeParser,
    normalizer: QueryNormalizer,
}

impl MediaParser {
    /// Create a new parser with the given configuration.
    pub fn new(config: ParserConfig) -> Result<Self> {
        Ok(Self {
            config,
            anime: AnimeParser::new()?,
            normalizer: QueryNormalizer::new()?,
        })
    }

    /// Create a new parser with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ParserConfig::default())
    }

    /// Classifies `input`.
    ///
    /// # Errors
    ///
    /// Returns `ShirabeError::EmptyInput` if the input is empty or whitespace-only.
    pub fn parse(&self, input: &str) -> Result<ParsedName> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ShirabeError::EmptyInput);
        }

        if self.config.kind_hint == Some(MediaKind::Movie) {
            return Ok(ParsedName::Movie(
                self.normalizer.query(trimmed, MediaKind::Movie),
            ));
        }

        if let Some(result) = self.anime.parse(trimmed) {
            return Ok(ParsedName::Show(result));
        }

        match self.config.kind_hint {
            Some(MediaKind::Tv) => {
                let title = self.normalizer.extract_title(trimmed);
                Ok(ParsedName::Show(AnimeParseResult::new(title)))
            }
            _ => Ok(ParsedName::Movie(
                self.normalizer.query(trimmed, MediaKind::Movie),
            )),
        }
    }

    /// The anime cascade.
    pub fn anime(&self) -> &AnimeParser {
        &self.anime
    }

    /// The query normalizer.
    pub fn normalizer(&self) -> &QueryNormalizer {
        &self.normalizer
    }

    /// Get the parser configuration.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }
}

/// Convenience function to classify a name with default settings.
pub fn parse(input: &str) -> Result<ParsedName> {
    MediaParser::with_defaults()?.parse(input)
}
