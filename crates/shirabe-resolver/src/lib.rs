//! # Shirabe Resolver
//!
//! Resolves media names to TMDB identities.
//!
//! A [`ResolverContext`] owns the provider client, the result cache and the
//! filename parser. Each resolution normalizes the query, consults the cache
//! and then walks the [fallback cascade](orchestrator) until a stage yields
//! candidates. Ambiguous results pause as a [`Disambiguation`] that the
//! caller resumes with a [`Selection`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use shirabe_resolver::{Outcome, ResolverConfig, ResolverContext};
//!
//! let ctx = ResolverContext::new(ResolverConfig::from_env()).unwrap();
//! match ctx.resolve_show("Attack on Titan S04E01", None, true, None, None).unwrap() {
//!     Outcome::Resolved(media) => println!("{media}"),
//!     Outcome::Unresolved(query) => println!("no match for {query}"),
//!     Outcome::NeedsDisambiguation(pending) => println!("{} candidates", pending.choices().len()),
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod context;
pub mod disambiguate;
pub mod episodes;
pub mod error;
pub mod language;
pub mod orchestrator;
pub mod provider;
pub mod retry;
pub mod scrape;

#[cfg(test)]
mod testing;

pub use cache::{CacheKey, CachedResolution, CachingTransport, EpisodeCache, ResultCache};
pub use client::{HttpTransport, Transport, redact_api_key};
pub use config::ResolverConfig;
pub use context::{ResolveRequest, ResolverContext};
pub use disambiguate::{Disambiguation, MAX_CHOICES, Outcome, Selection};
pub use episodes::{apply_episode, complete_episode, map_absolute_episode};
pub use error::{ProviderError, ProviderResult, ResolveError, Result};
pub use language::locale_for;
pub use orchestrator::{Stage, StageHit};
pub use provider::{MetadataProvider, SeasonSummary, TmdbProvider};
pub use retry::RetryPolicy;
