use std::time::Duration;

use crate::error::{ProviderError, ProviderResult};
use crate::language::{self, DEFAULT_LOCALE};
use crate::retry::RetryPolicy;

/// Default TMDB API root.
pub const DEFAULT_API_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Default TMDB website root (used by the scrape fallback).
pub const DEFAULT_SITE_BASE_URL: &str = "https://www.themoviedb.org";

/// Resolver configuration.
#[derive(Clone)]
pub struct ResolverConfig {
    /// TMDB v3 API key.
    pub api_key: String,
    /// Language display name or locale; see [`locale`](Self::locale).
    pub language: String,
    /// API root, without trailing slash.
    pub api_base_url: String,
    /// Website root, without trailing slash.
    pub site_base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// `User-Agent` header for API and website requests.
    pub user_agent: String,
    /// Backoff for transient failures.
    pub retry: RetryPolicy,
    /// Whether the website search page is tried when the API finds nothing.
    pub scrape_fallback: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: DEFAULT_LOCALE.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            site_base_url: DEFAULT_SITE_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            user_agent: concat!("shirabe/", env!("CARGO_PKG_VERSION")).to_string(),
            retry: RetryPolicy::default(),
            scrape_fallback: true,
        }
    }
}

// Hand-written so the key never reaches a log line.
impl std::fmt::Debug for ResolverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverConfig")
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("language", &self.language)
            .field("api_base_url", &self.api_base_url)
            .field("site_base_url", &self.site_base_url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("retry", &self.retry)
            .field("scrape_fallback", &self.scrape_fallback)
            .finish()
    }
}

impl ResolverConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `TMDB_API_KEY`, `TMDB_LANGUAGE` (or `LANGUAGE`), `TMDB_API_URL`
    /// and `TMDB_SITE_URL` on top of the defaults.
    pub fn from_env() -> Self {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(key) = var("TMDB_API_KEY") {
            config.api_key = key;
        }
        if let Some(language) = var("TMDB_LANGUAGE").or_else(|| var("LANGUAGE")) {
            config.language = language;
        }
        if let Some(url) = var("TMDB_API_URL") {
            config = config.with_api_base_url(url);
        }
        if let Some(url) = var("TMDB_SITE_URL") {
            config = config.with_site_base_url(url);
        }
        config
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into().trim().to_string();
        self
    }

    /// Set the language (display name or locale).
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the API root.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the website root.
    pub fn with_site_base_url(mut self, url: impl Into<String>) -> Self {
        self.site_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Enable or disable the website scrape fallback.
    pub fn with_scrape_fallback(mut self, enabled: bool) -> Self {
        self.scrape_fallback = enabled;
        self
    }

    /// Provider locale for the configured language.
    pub fn locale(&self) -> &str {
        language::locale_for(&self.language)
    }

    /// Rejects a configuration that cannot reach the provider.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Credential` if no API key is set.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::Credential);
        }
        Ok(())
    }
}
