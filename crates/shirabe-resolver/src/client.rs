//! # HTTP Transport
//!
//! Thin GET layer between the provider client and the network. A single
//! blocking `reqwest` client is reused for every request; responses are
//! classified into [`ProviderError`] variants so the retry policy and the
//! search cascade can decide what to do without inspecting HTTP details.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde_json::Value;

use crate::config::ResolverConfig;
use crate::error::{ProviderError, ProviderResult, ResolveError};

/// Query parameters for a GET request.
pub type Params<'a> = [(&'a str, String)];

/// GET access to the provider.
///
/// Implementations must be shareable across threads; the resolver calls
/// them from whatever thread runs a resolution.
pub trait Transport: Send + Sync {
    /// GETs `endpoint` (relative to the API root, e.g. `/search/tv`) and
    /// decodes the body as JSON. The credential is attached by the transport.
    fn get_json(&self, endpoint: &str, params: &Params<'_>) -> ProviderResult<Value>;

    /// GETs an absolute website URL and returns the body text.
    fn get_text(&self, url: &str, params: &Params<'_>) -> ProviderResult<String>;
}

/// Production transport over `reqwest::blocking`.
pub struct HttpTransport {
    client: Client,
    api_base_url: String,
    api_key: String,
}

impl HttpTransport {
    /// Builds the shared HTTP client from `config`.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::Http` if the TLS backend cannot be initialized.
    pub fn new(config: &ResolverConfig) -> Result<Self, ResolveError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ResolveError::Http(redact_api_key(&e.to_string())))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("api_base_url", &self.api_base_url)
            .finish_non_exhaustive()
    }
}

impl Transport for HttpTransport {
    fn get_json(&self, endpoint: &str, params: &Params<'_>) -> ProviderResult<Value> {
        if self.api_key.is_empty() {
            tracing::error!(endpoint, "no TMDB API key configured");
            return Err(ProviderError::Credential);
        }

        tracing::debug!(endpoint, ?params, "GET");
        let response = self
            .client
            .get(format!("{}{}", self.api_base_url, endpoint))
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .map_err(classify_error)?;

        check_status(response)?.json::<Value>().map_err(classify_error)
    }

    fn get_text(&self, url: &str, params: &Params<'_>) -> ProviderResult<String> {
        tracing::debug!(url, ?params, "GET page");
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .map_err(classify_error)?;

        check_status(response)?.text().map_err(classify_error)
    }
}

/// Maps a non-success status to an error, passing successful responses through.
fn check_status(response: Response) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(classify_status(
        status,
        response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok()),
    ))
}

/// 401 is a credential failure, 429 and 5xx are transient, anything else
/// is permanent.
pub fn classify_status(status: StatusCode, retry_after: Option<&str>) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED => ProviderError::Credential,
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
            retry_after: retry_after
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
        },
        s if s.is_server_error() => ProviderError::Transient {
            reason: format!("HTTP {}", s.as_u16()),
        },
        s => ProviderError::Permanent {
            status: s.as_u16(),
            reason: s.canonical_reason().unwrap_or("unexpected status").to_string(),
        },
    }
}

fn classify_error(err: reqwest::Error) -> ProviderError {
    let err = err.without_url();
    let reason = redact_api_key(&err.to_string());
    if err.is_decode() {
        ProviderError::Malformed(reason)
    } else if let Some(status) = err.status() {
        classify_status(status, None)
    } else {
        ProviderError::Transient { reason }
    }
}

/// Replaces every `api_key=<value>` with `api_key=***`.
#[must_use]
pub fn redact_api_key(text: &str) -> String {
    const NEEDLE: &str = "api_key=";

    // ASCII lower-casing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut rest = 0;
    while let Some(pos) = lower[rest..].find(NEEDLE) {
        let value_start = rest + pos + NEEDLE.len();
        out.push_str(&text[rest..value_start]);
        out.push_str("***");
        rest = text[value_start..]
            .find(|c: char| matches!(c, '&' | '"' | '\'' | ')' | '>') || c.is_whitespace())
            .map_or(text.len(), |i| value_start + i);
    }
    out.push_str(&text[rest..]);
    out
}
