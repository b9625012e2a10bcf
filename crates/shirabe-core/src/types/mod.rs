pub mod candidate;
pub mod episode;
pub mod media;
pub mod result;

pub use candidate::{Candidate, ScoredCandidate};
pub use episode::{EpisodeContext, PaddedNumber};
pub use media::{DirectId, ExternalIds, MediaKind, Query};
pub use result::{AnimeParseResult, ResolvedMedia};
