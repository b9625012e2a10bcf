pub mod anime;
pub mod normalize;
pub mod unified;

pub use anime::{AnimeParser, PatternFamily};
pub use normalize::{is_trivial_query, QueryNormalizer};
pub use unified::{parse, MediaParser, ParsedName, ParserConfig};
