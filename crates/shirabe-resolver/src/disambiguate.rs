//! Interactive disambiguation state.
//!
//! When a cascade stage yields several plausible candidates and the caller
//! did not ask for automatic selection, resolution pauses and hands back a
//! [`Disambiguation`]. The caller answers with a [`Selection`] and passes
//! both to [`ResolverContext::resume`](crate::ResolverContext::resume).

use shirabe_core::{Query, ResolvedMedia, ScoredCandidate};

use crate::context::ResolveRequest;
use crate::orchestrator::Stage;

/// Number of candidates offered to the user.
pub const MAX_CHOICES: usize = 3;

/// Result of one resolution call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A confirmed identity.
    Resolved(ResolvedMedia),
    /// Every stage failed; holds the caller's original text.
    Unresolved(String),
    /// Several candidates fit and the caller must choose.
    NeedsDisambiguation(Disambiguation),
}

impl Outcome {
    /// The resolved identity, if any.
    #[must_use]
    pub fn resolved(&self) -> Option<&ResolvedMedia> {
        match self {
            Self::Resolved(media) => Some(media),
            _ => None,
        }
    }

    /// Consumes the outcome, returning the resolved identity if any.
    #[must_use]
    pub fn into_resolved(self) -> Option<ResolvedMedia> {
        match self {
            Self::Resolved(media) => Some(media),
            _ => None,
        }
    }
}

/// A paused resolution waiting for the caller to choose a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Disambiguation {
    request: ResolveRequest,
    query: Query,
    stage: Stage,
    candidates: Vec<ScoredCandidate>,
}

impl Disambiguation {
    pub(crate) fn new(
        request: ResolveRequest,
        query: Query,
        stage: Stage,
        candidates: Vec<ScoredCandidate>,
    ) -> Self {
        Self {
            request,
            query,
            stage,
            candidates,
        }
    }

    /// Same paused resolution with a fresh candidate list.
    pub(crate) fn with_candidates(self, stage: Stage, candidates: Vec<ScoredCandidate>) -> Self {
        Self {
            stage,
            candidates,
            ..self
        }
    }

    /// The request that produced this state.
    #[must_use]
    pub fn request(&self) -> &ResolveRequest {
        &self.request
    }

    /// The normalized query the candidates were found for.
    #[must_use]
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// The cascade stage that produced the candidates.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Every candidate of the stage that fired, best first.
    #[must_use]
    pub fn candidates(&self) -> &[ScoredCandidate] {
        &self.candidates
    }

    /// The candidates offered to the user (at most [`MAX_CHOICES`]).
    #[must_use]
    pub fn choices(&self) -> &[ScoredCandidate] {
        &self.candidates[..self.candidates.len().min(MAX_CHOICES)]
    }

    /// Parses a user's answer against the offered choices.
    #[must_use]
    pub fn selection(&self, input: &str) -> Selection {
        Selection::parse(input, self.choices().len())
    }
}

/// A user's answer to a [`Disambiguation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Accept the top candidate.
    Default,
    /// Pick the n-th offered candidate (1-based).
    Pick(usize),
    /// Search again with new text.
    Search(String),
}

impl Selection {
    /// Empty input accepts the default, `1..=shown` picks, anything else is
    /// a new search term.
    #[must_use]
    pub fn parse(input: &str, shown: usize) -> Self {
        let input = input.trim();
        if input.is_empty() {
            return Self::Default;
        }
        match input.parse::<usize>() {
            Ok(n) if (1..=shown).contains(&n) => Self::Pick(n),
            _ => Self::Search(input.to_string()),
        }
    }
}
