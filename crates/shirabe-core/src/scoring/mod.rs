//! # Match Scoring
//!
//! Relevance of a provider [`Candidate`] to a search string, plus the
//! threshold selection used by the search cascade.
//!
//! The score is a sum of independent bonuses:
//!
//! | Component | Points |
//! |-----------|--------|
//! | Exact title match (display or original) | 50 |
//! | Containment either way | 20 |
//! | Normalized edit similarity | 0–25 |
//! | Same year / off by one | 30 / 15 |
//! | English original language | 10 |
//! | English-speaking origin country | 5 |
//! | Popularity | 0–15 |
//! | Shared words | 0–10 |
//!
//! minus up to 10 points when the title length diverges sharply from the query.

use std::collections::HashSet;

use serde_json::Value;

use crate::types::{Candidate, ScoredCandidate};

/// Threshold for the primary, high-confidence pass.
pub const PRIMARY_THRESHOLD: i32 = 50;

/// Threshold for secondary and fallback passes.
pub const BROAD_THRESHOLD: i32 = 40;

/// How many raw results are surfaced when nothing clears the threshold.
pub const FALLBACK_TOP: usize = 3;

const ENGLISH_COUNTRIES: &[&str] = &["GB", "US", "CA", "AU", "NZ"];

/// Scores `candidate` against `query` (and `year`, when known).
///
/// Deterministic; never negative.
#[must_use]
pub fn score(candidate: &Candidate, query: &str, year: Option<u16>) -> i32 {
    let query = query.trim().to_lowercase();
    let title = candidate.display_name.trim().to_lowercase();
    let original = candidate
        .original_name
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default();

    let mut total = 0.0;

    if query == title || (!original.is_empty() && query == original) {
        total += 50.0;
    } else if contains_either(&query, &title) || contains_either(&query, &original) {
        total += 20.0;
    }

    total += strsim::normalized_levenshtein(&query, &title) * 25.0;

    if let (Some(wanted), Some(actual)) = (year, candidate.year()) {
        match wanted.abs_diff(actual) {
            0 => total += 30.0,
            1 => total += 15.0,
            _ => {}
        }
    }

    let payload = &candidate.payload;
    if payload.get("original_language").and_then(Value::as_str) == Some("en") {
        total += 10.0;
    }
    let english_origin = payload
        .get("origin_country")
        .and_then(Value::as_array)
        .is_some_and(|countries| {
            countries
                .iter()
                .filter_map(Value::as_str)
                .any(|c| ENGLISH_COUNTRIES.contains(&c))
        });
    if english_origin {
        total += 5.0;
    }

    let popularity = candidate.popularity();
    if popularity > 0.0 {
        total += (popularity / 100.0 * 15.0).min(15.0);
    }

    total += word_overlap(&query, &title);
    total -= length_penalty(&query, &title);

    total.max(0.0).round() as i32
}

/// Scores every candidate and sorts by descending score.
///
/// The sort is stable, so provider order breaks ties.
#[must_use]
pub fn rank(candidates: &[Candidate], query: &str, year: Option<u16>) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .iter()
        .map(|c| ScoredCandidate {
            candidate: c.clone(),
            score: score(c, query, year),
        })
        .collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}

/// Candidates clearing `threshold`, best first.
///
/// When none clears it, the first [`FALLBACK_TOP`] results in provider order
/// are returned instead (still sorted by score) so that noisy titles are not
/// written off entirely.
#[must_use]
pub fn select(
    candidates: &[Candidate],
    query: &str,
    year: Option<u16>,
    threshold: i32,
) -> Vec<ScoredCandidate> {
    let ranked = rank(candidates, query, year);
    let above: Vec<ScoredCandidate> = ranked
        .into_iter()
        .filter(|s| s.score >= threshold)
        .collect();
    if !above.is_empty() {
        return above;
    }

    let head = &candidates[..candidates.len().min(FALLBACK_TOP)];
    let fallback = rank(head, query, year);
    if !fallback.is_empty() {
        tracing::debug!(
            query,
            threshold,
            best = fallback[0].score,
            "no candidate cleared threshold, surfacing top results"
        );
    }
    fallback
}

fn contains_either(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

fn word_overlap(query: &str, title: &str) -> f64 {
    let query_words: HashSet<&str> = query.split_whitespace().collect();
    if query_words.is_empty() {
        return 0.0;
    }
    let title_words: HashSet<&str> = title.split_whitespace().collect();
    let shared = query_words.intersection(&title_words).count();
    (shared as f64 / query_words.len() as f64 * 10.0).min(10.0)
}

fn length_penalty(query: &str, title: &str) -> f64 {
    let q = query.chars().count().max(1) as f64;
    let t = title.chars().count().max(1) as f64;
    let ratio = q.max(t) / q.min(t);
    if ratio >= 3.0 {
        10.0
    } else if ratio >= 2.0 {
        5.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn candidate(value: serde_json::Value) -> Candidate {
        Candidate::from_payload(&value).unwrap()
    }

    fn matrix() -> Candidate {
        candidate(json!({
            "id": 603,
            "title": "The Matrix",
            "release_date": "1999-03-30",
            "original_language": "en",
            "popularity": 80.0
        }))
    }

    #[test]
    fn exact_match_with_year_scores_high() {
        let s = score(&matrix(), "The Matrix", Some(1999));
        // 50 exact + 25 similarity + 30 year + 10 language + 12 popularity + 10 words
        assert_eq!(s, 137);
    }

    #[test]
    fn year_bonus_tiers() {
        let exact = score(&matrix(), "the matrix", Some(1999));
        let near = score(&matrix(), "the matrix", Some(2000));
        let far = score(&matrix(), "the matrix", Some(2010));
        assert_eq!(exact - near, 15);
        assert_eq!(near - far, 15);
    }

    #[test]
    fn original_title_counts_as_exact() {
        let c = candidate(json!({
            "id": 1429,
            "name": "Attack on Titan",
            "original_name": "Shingeki no Kyojin"
        }));
        assert!(score(&c, "shingeki no kyojin", None) >= PRIMARY_THRESHOLD);
    }

    #[test]
    fn divergent_length_is_penalized() {
        let short = candidate(json!({"id": 1, "title": "Up"}));
        let long = candidate(json!({"id": 2, "title": "Up Close and Personal With Nature"}));
        assert!(score(&short, "up", None) > score(&long, "up", None));
    }

    #[test]
    fn score_is_never_negative() {
        let c = candidate(json!({"id": 9, "title": "Completely Unrelated Long Documentary"}));
        assert!(score(&c, "zz", None) >= 0);
    }

    #[test]
    fn rank_sorts_descending() {
        let list = vec![
            candidate(json!({"id": 1, "title": "Matrix Reloaded Behind The Scenes"})),
            matrix(),
            candidate(json!({"id": 3, "title": "The Matrix Revisited"})),
        ];
        let ranked = rank(&list, "The Matrix", Some(1999));
        assert_eq!(ranked[0].candidate.provider_id, 603);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn select_keeps_only_candidates_above_threshold() {
        let list = vec![
            candidate(json!({"id": 1, "title": "Matrix Reloaded Behind The Scenes"})),
            matrix(),
        ];
        let picked = select(&list, "The Matrix", Some(1999), PRIMARY_THRESHOLD);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].candidate.provider_id, 603);
    }

    #[test]
    fn select_falls_back_to_top_three_raw_results() {
        let list: Vec<Candidate> = (1..=5)
            .map(|id| candidate(json!({"id": id, "title": format!("Unrelated Title Number {id}")})))
            .collect();
        let picked = select(&list, "zzz", None, PRIMARY_THRESHOLD);
        assert_eq!(picked.len(), FALLBACK_TOP);
        let mut ids: Vec<u64> = picked.iter().map(|s| s.candidate.provider_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(picked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn select_on_empty_input_is_empty() {
        assert!(select(&[], "anything", None, BROAD_THRESHOLD).is_empty());
    }
}
