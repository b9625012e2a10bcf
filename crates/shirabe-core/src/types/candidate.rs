use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One search result returned by the provider.
///
/// Ephemeral: produced per search call, consumed by scoring and selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Provider record ID.
    pub provider_id: u64,
    /// Localized title (`title` for movies, `name` for shows).
    pub display_name: String,
    /// Original-language title, when different.
    pub original_name: Option<String>,
    /// `YYYY-MM-DD` release or first-air date.
    pub date: Option<String>,
    /// The record as the provider returned it.
    pub payload: Value,
}

impl Candidate {
    /// Builds a candidate from a provider JSON record.
    ///
    /// Accepts both movie (`title`, `original_title`, `release_date`) and
    /// show (`name`, `original_name`, `first_air_date`) shapes. The ID may be
    /// a number or a numeric string. Returns `None` when there is no usable
    /// ID or title.
    #[must_use]
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let provider_id = match payload.get("id")? {
            Value::Number(n) => n.as_u64()?,
            Value::String(s) => s.parse().ok()?,
            _ => return None,
        };

        let text = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| payload.get(*k).and_then(Value::as_str))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let display_name = text(&["title", "name"])?;
        let original_name = text(&["original_title", "original_name"]);
        let date = text(&["release_date", "first_air_date"]);

        Some(Self {
            provider_id,
            display_name,
            original_name,
            date,
            payload: payload.clone(),
        })
    }

    /// Year component of the date, if it parses.
    #[must_use]
    pub fn year(&self) -> Option<u16> {
        self.date
            .as_deref()
            .and_then(|d| d.split('-').next())
            .and_then(|y| y.parse().ok())
    }

    /// Provider popularity metric, `0.0` when absent.
    #[must_use]
    pub fn popularity(&self) -> f64 {
        self.payload
            .get("popularity")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }
}

/// A candidate paired with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// The scored candidate.
    pub candidate: Candidate,
    /// Relevance score, roughly `0..=150`.
    pub score: i32,
}
