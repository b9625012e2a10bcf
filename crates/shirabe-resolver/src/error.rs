use std::time::Duration;

use shirabe_core::ShirabeError;
use thiserror::Error;

/// Failures talking to the metadata provider.
///
/// Every message that may carry a URL has already been passed through
/// [`redact_api_key`](crate::client::redact_api_key).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Missing or rejected API key. Never retried; aborts the resolution.
    #[error("TMDB API key is missing or was rejected")]
    Credential,

    /// Timeout, connection failure or 5xx.
    #[error("transient provider failure: {reason}")]
    Transient {
        /// Redacted description of the failure.
        reason: String,
    },

    /// HTTP 429.
    #[error("rate limited by provider (retry after {retry_after:?})")]
    RateLimited {
        /// Value of the `Retry-After` header, if the provider sent one.
        retry_after: Option<Duration>,
    },

    /// Any other non-success status.
    #[error("provider returned HTTP {status}: {reason}")]
    Permanent {
        /// HTTP status code.
        status: u16,
        /// Redacted description.
        reason: String,
    },

    /// The body could not be decoded.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// The website search page could not be fetched or parsed.
    #[error("website scrape failed: {0}")]
    Scrape(String),
}

impl ProviderError {
    /// Whether the retry policy should try again.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::RateLimited { .. })
    }

    /// Whether the failure must abort the whole resolution.
    #[must_use]
    pub fn is_credential(&self) -> bool {
        matches!(self, Self::Credential)
    }
}

/// Result type alias for provider calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Errors that abort a resolution.
///
/// "Nothing found" is not an error; it is reported as
/// [`Outcome::Unresolved`](crate::Outcome::Unresolved).
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The provider rejected (or was never given) a credential.
    #[error("TMDB API key is missing or was rejected")]
    Credential,

    /// Failure inside the offline engine.
    #[error(transparent)]
    Core(#[from] ShirabeError),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Http(String),

    /// A provider call outside the search cascade failed.
    #[error(transparent)]
    Provider(ProviderError),
}

impl From<ProviderError> for ResolveError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Credential => Self::Credential,
            other => Self::Provider(other),
        }
    }
}

/// Result type alias for resolver operations.
pub type Result<T> = std::result::Result<T, ResolveError>;
