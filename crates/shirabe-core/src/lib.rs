//! # Shirabe Core
//!
//! Offline half of the Shirabe media identity resolver: the anime filename
//! cascade, query normalization, candidate scoring and the shared data types.
//! Nothing here performs I/O.
//!
//! ## Quick Start
//!
//! ```rust
//! use shirabe_core::parser::AnimeParser;
//!
//! let parser = AnimeParser::new().unwrap();
//! let result = parser.parse("[SubsPlease] Jujutsu Kaisen - 24 (1080p) [A1B2C3D4].mkv").unwrap();
//!
//! assert_eq!(result.show_name, "Jujutsu Kaisen");
//! assert_eq!(result.episode_number.unwrap().to_string(), "24");
//! ```
pub mod error;
pub mod parser;
pub mod scoring;
pub mod types;

// Re-export primary API
pub use error::{Result, ShirabeError};
pub use parser::{
    AnimeParser, MediaParser, ParsedName, ParserConfig, PatternFamily, QueryNormalizer,
    is_trivial_query,
};
pub use scoring::{BROAD_THRESHOLD, FALLBACK_TOP, PRIMARY_THRESHOLD};
pub use types::{
    AnimeParseResult, Candidate, DirectId, EpisodeContext, ExternalIds, MediaKind, PaddedNumber,
    Query, ResolvedMedia, ScoredCandidate,
};
