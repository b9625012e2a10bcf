//! # Shirabe
//!
//! Media file names in, canonical TMDB identities out.
//!
//! - [`shirabe_core`]: filename parsing, query normalization and scoring. No I/O.
//! - [`shirabe_resolver`]: the provider client, caches and the fallback search.
//!
//! ```no_run
//! use shirabe::{ResolverConfig, ResolverContext};
//!
//! let ctx = ResolverContext::new(ResolverConfig::from_env()).unwrap();
//! let outcome = ctx
//!     .resolve_file("[SubsPlease] Jujutsu Kaisen - 24 (1080p).mkv", None, true)
//!     .unwrap();
//! if let Some(media) = outcome.resolved() {
//!     println!("{media}");
//! }
//! ```

pub use shirabe_core;
pub use shirabe_resolver;

pub use shirabe_core::{
    AnimeParseResult, AnimeParser, Candidate, DirectId, EpisodeContext, ExternalIds, MediaKind,
    MediaParser, PaddedNumber, ParsedName, Query, QueryNormalizer, ResolvedMedia, ScoredCandidate,
    ShirabeError,
};
pub use shirabe_resolver::{
    Disambiguation, MetadataProvider, Outcome, ResolveError, ResolveRequest, ResolverConfig,
    ResolverContext, RetryPolicy, Selection,
};
