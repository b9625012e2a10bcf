use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, ShirabeError};

/// A season or episode number that always renders with at least two digits.
///
/// Serializes as a string (`7` → `"07"`, `112` → `"112"`) so that
/// downstream renamers can splice it into `S01E07`-style names directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PaddedNumber(u32);

impl PaddedNumber {
    /// Wraps a raw number.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Parses a captured digit run such as `"5"`, `"05"` or `"0012"`.
    ///
    /// # Errors
    ///
    /// Returns `ShirabeError::InvalidNumber` if the text is not a plain
    /// non-negative integer.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ShirabeError::InvalidNumber {
                input: input.to_string(),
            });
        }
        trimmed
            .parse::<u32>()
            .map(Self)
            .map_err(|_| ShirabeError::InvalidNumber {
                input: input.to_string(),
            })
    }
}

impl From<u32> for PaddedNumber {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl FromStr for PaddedNumber {
    type Err = ShirabeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PaddedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl Serialize for PaddedNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PaddedNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Episode-level information known about a file before the provider is asked.
///
/// Applied on top of a resolved show identity; never part of the show-level cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpisodeContext {
    /// Season number, if the filename carried one.
    pub season: Option<PaddedNumber>,
    /// Episode number (or special number for extras).
    pub episode: Option<PaddedNumber>,
    /// Episode title suffix, if the filename carried one.
    pub episode_title: Option<String>,
    /// Special/OVA/extra content.
    pub is_extra: bool,
}

impl EpisodeContext {
    /// Creates a context with a season and episode.
    #[must_use]
    pub fn new(season: Option<u32>, episode: Option<u32>) -> Self {
        Self {
            season: season.map(PaddedNumber::new),
            episode: episode.map(PaddedNumber::new),
            episode_title: None,
            is_extra: false,
        }
    }

    /// Marks the context as extra content.
    #[must_use]
    pub fn extra(mut self) -> Self {
        self.is_extra = true;
        self
    }

    /// Returns `true` if neither a season nor an episode is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.season.is_none() && self.episode.is_none()
    }
}
