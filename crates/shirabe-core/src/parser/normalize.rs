//! # Query Normalizer
//!
//! Pure string transforms that turn a loosely formatted media name into a
//! provider search string: bracket and scene-tag stripping, year extraction,
//! title extraction and last-resort truncation.

use std::borrow::Cow;

use regex::{Captures, Regex};

use crate::error::Result;
use crate::types::{MediaKind, Query};

/// Years outside this range are treated as part of the title (`Blade Runner 2049`).
const MIN_YEAR: u16 = 1900;
const MAX_YEAR: u16 = 2039;

/// Scene-release tokens that never belong to a title.
const SCENE_TAGS: &str = r"2160p|1080p|1080i|720p|576p|480p|4k|uhd|x\.?264|x\.?265|h\.?264|h\.?265|hevc|avc|av1|xvid|divx|10-?bit|8-?bit|hdr10\+?|hdr|dovi|blu-?ray|bdrip|brrip|bdremux|remux|web-?dl|web-?rip|hdtv|hdrip|dvdrip|dvd|amzn|nf|dsnp|hmax|repack|proper|extended|unrated|uncut|remastered|aac2\.0|aac|ac3|eac3|ddp5\.1|dd5\.1|ddp|dts-?hd|dts|truehd|atmos|flac|opus|mp3|5\.1|7\.1|multi|dual[ ._-]?audio|subbed|dubbed|vostfr";

/// Genre words stripped before scraping the provider website.
const GENRE_NAMES: &[&str] = &[
    "action",
    "adventure",
    "animation",
    "anime",
    "comedy",
    "crime",
    "documentary",
    "drama",
    "family",
    "fantasy",
    "history",
    "horror",
    "music",
    "mystery",
    "romance",
    "science fiction",
    "sci-fi",
    "thriller",
    "war",
    "western",
];

/// Regex-backed query normalizer.
///
/// All operations are deterministic and perform no I/O.
#[derive(Debug, Clone)]
pub struct QueryNormalizer {
    re_paren_year: Regex,
    re_isolated_year: Regex,
    re_brackets: Regex,
    re_separators: Regex,
    re_scene: Regex,
    re_scene_token: Regex,
    re_noise_chars: Regex,
    re_whitespace: Regex,
    re_metadata_start: Regex,
    re_leading_group: Regex,
    re_episode_token: Regex,
    re_trailing_paren: Regex,
    re_genres: Regex,
    re_extension: Regex,
}

impl QueryNormalizer {
    /// Constructs a new `QueryNormalizer` with pre-compiled patterns.
    ///
    /// # Errors
    ///
    /// Returns `ShirabeError::RegexError` if any pattern fails to compile.
    pub fn new() -> Result<Self> {
        let genres = GENRE_NAMES
            .iter()
            .map(|g| regex::escape(g))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            re_paren_year: Regex::new(r"[\(\[]\s*((?:19|20)\d{2})\s*[\)\]]")?,
            re_isolated_year: Regex::new(r"(?:^|[\s._\-])((?:19|20)\d{2})(?:[\s._\-]|$)")?,
            re_brackets: Regex::new(r"\[[^\]]*\]|\{[^\}]*\}|\([^\)]*\)")?,
            re_separators: Regex::new(r"[._]")?,
            re_scene: Regex::new(&format!(r"(?i)\b(?:{SCENE_TAGS})\b"))?,
            re_scene_token: Regex::new(&format!(r"(?i)^(?:{SCENE_TAGS})$"))?,
            re_noise_chars: Regex::new(r##"["#$%*+/;<=>@\\^`|~]"##)?,
            re_whitespace: Regex::new(r"\s+")?,
            re_metadata_start: Regex::new(&format!(
                r"(?i)\b(?:(?:19|20)\d{{2}}|S\d{{1,2}}E\d{{1,4}}|S\d{{1,2}}|\d{{1,2}}x\d{{1,3}}|season\s*\d+|{SCENE_TAGS})\b|[\[\(\{{]"
            ))?,
            re_leading_group: Regex::new(r"^\s*\[[^\]]*\]\s*")?,
            re_episode_token: Regex::new(r"(?i)^(?:S\d{1,2}(?:E\d{1,4})?|E\d{1,4}|\d{1,2}x\d{1,3}|\d+)$")?,
            re_trailing_paren: Regex::new(r"\s*\(.*$")?,
            re_genres: Regex::new(&format!(r"(?i)\b(?:{genres})\b"))?,
            re_extension: Regex::new(
                r"(?i)\.(?:mkv|mp4|avi|m4v|mov|wmv|flv|webm|ts|m2ts|ogm|rmvb|iso|srt|ass)$",
            )?,
        })
    }

    /// Normalizes a raw query into a clean search string plus an optional year.
    ///
    /// Strips surrounding quotes and whitespace, extracts a `(19|20)\d{2}`
    /// year when it is parenthesized or stands alone, removes bracketed tags,
    /// scene-release noise and stray punctuation, and collapses whitespace.
    /// A year that is the whole title (`1917`) is kept as title text.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> (String, Option<u16>) {
        let trimmed = self.strip_extension(trim_quotes(raw));
        let trimmed: &str = &trimmed;
        let (without_year, year) = self.take_year(trimmed);

        let mut work = self.re_brackets.replace_all(&without_year, " ").into_owned();
        work = self.re_separators.replace_all(&work, " ").into_owned();
        work = self.re_scene.replace_all(&work, " ").into_owned();
        work = self.re_noise_chars.replace_all(&work, " ").into_owned();
        let cleaned = self.collapse(&work);

        if cleaned.is_empty() {
            // Nothing but the year (or noise) was left; keep the raw title.
            return (self.collapse(&self.re_separators.replace_all(trimmed, " ")), None);
        }
        (cleaned, year)
    }

    /// Builds a [`Query`] from raw caller input.
    #[must_use]
    pub fn query(&self, raw: &str, kind: MediaKind) -> Query {
        let (cleaned, year) = self.normalize(raw);
        Query::new(raw.trim(), cleaned, year, kind)
    }

    /// Last-resort cleaning: drops bracketed content, scene tags, years and
    /// episode markers, then keeps the first `max_words` tokens.
    #[must_use]
    pub fn aggressive_clean(&self, text: &str, max_words: usize) -> String {
        let work = self.strip_extension(trim_quotes(text));
        let work = self.re_brackets.replace_all(&work, " ");
        let work = self.re_separators.replace_all(&work, " ");

        work.split_whitespace()
            .filter(|token| !self.is_noise_token(token))
            .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|token| !token.is_empty())
            .take(max_words)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Separates a title from trailing noise: everything before the first
    /// year, episode marker, scene tag or bracket. Falls back to
    /// [`normalize`](Self::normalize) when nothing precedes the noise.
    #[must_use]
    pub fn extract_title(&self, text: &str) -> String {
        let trimmed = self.strip_extension(trim_quotes(text));
        let work = self.re_leading_group.replace(&trimmed, "");
        let work = self.re_separators.replace_all(&work, " ");

        let cut = self
            .re_metadata_start
            .find(&work)
            .map_or(work.len(), |m| m.start());
        let title = self.collapse(&work[..cut]);

        if title.is_empty() {
            self.normalize(text).0
        } else {
            title
        }
    }

    /// Drops everything from the first opening parenthesis.
    #[must_use]
    pub fn strip_trailing_parenthetical(&self, text: &str) -> String {
        self.re_trailing_paren.replace(text, "").trim().to_string()
    }

    /// Removes genre words (used before website scraping).
    #[must_use]
    pub fn remove_genre_names(&self, text: &str) -> String {
        let stripped = self.collapse(&self.re_genres.replace_all(text, " "));
        if stripped.is_empty() {
            text.trim().to_string()
        } else {
            stripped
        }
    }

    /// Shape sent to the provider search endpoint: lower-cased, `&` spelled out.
    #[must_use]
    pub fn provider_query(&self, text: &str) -> String {
        self.collapse(&text.replace('&', " and ")).to_lowercase()
    }

    /// Drops a trailing media-file extension (`.mkv`, `.srt`, ...).
    #[must_use]
    pub fn strip_extension<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.re_extension.replace(text, "")
    }

    /// Extracts the preferred year and returns the text without it.
    fn take_year<'a>(&self, text: &'a str) -> (Cow<'a, str>, Option<u16>) {
        let parenthesized = self
            .re_paren_year
            .captures_iter(text)
            .filter_map(|c| year_capture(&c).map(|y| (c.get(0), y)))
            .last();
        if let Some((Some(whole), year)) = parenthesized {
            let mut out = String::with_capacity(text.len());
            out.push_str(&text[..whole.start()]);
            out.push(' ');
            out.push_str(&text[whole.end()..]);
            return (out.into(), Some(year));
        }

        let isolated = self
            .re_isolated_year
            .captures_iter(text)
            .filter_map(|c| year_capture(&c).map(|y| (c.get(1), y)))
            .last();
        if let Some((Some(digits), year)) = isolated {
            let mut out = String::with_capacity(text.len());
            out.push_str(&text[..digits.start()]);
            out.push(' ');
            out.push_str(&text[digits.end()..]);
            return (out.into(), Some(year));
        }

        (text.into(), None)
    }

    fn is_noise_token(&self, token: &str) -> bool {
        let head = token.split('-').next().unwrap_or(token);
        self.re_scene_token.is_match(token)
            || self.re_scene_token.is_match(head)
            || self.re_episode_token.is_match(token)
    }

    fn collapse(&self, text: &str) -> String {
        self.re_whitespace
            .replace_all(text, " ")
            .trim_matches(|c: char| c == '-' || c.is_whitespace())
            .to_string()
    }
}

/// Returns `true` for queries not worth a provider call (empty or one character).
#[must_use]
pub fn is_trivial_query(text: &str) -> bool {
    text.trim().chars().count() <= 1
}

fn trim_quotes(text: &str) -> &str {
    text.trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace())
}

fn year_capture(caps: &Captures<'_>) -> Option<u16> {
    let year: u16 = caps.get(1)?.as_str().parse().ok()?;
    (MIN_YEAR..=MAX_YEAR).contains(&year).then_some(year)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> QueryNormalizer {
        QueryNormalizer::new().unwrap()
    }

    #[test]
    fn strips_quotes_and_collapses_whitespace() {
        let n = normalizer();
        assert_eq!(n.normalize("  \"The   Office\"  "), ("The Office".to_string(), None));
    }

    #[test]
    fn extracts_parenthesized_year() {
        let n = normalizer();
        assert_eq!(
            n.normalize("The.Matrix.(1999).1080p.BluRay.x264"),
            ("The Matrix".to_string(), Some(1999))
        );
        assert_eq!(n.normalize("Dune [2021]"), ("Dune".to_string(), Some(2021)));
    }

    #[test]
    fn extracts_isolated_year() {
        let n = normalizer();
        assert_eq!(n.normalize("Heat 1995"), ("Heat".to_string(), Some(1995)));
        assert_eq!(
            n.normalize("Parasite.2019.720p.WEB-DL"),
            ("Parasite".to_string(), Some(2019))
        );
    }

    #[test]
    fn out_of_range_year_stays_in_title() {
        let n = normalizer();
        assert_eq!(
            n.normalize("Blade Runner 2049"),
            ("Blade Runner 2049".to_string(), None)
        );
    }

    #[test]
    fn file_extensions_are_dropped() {
        let n = normalizer();
        assert_eq!(
            n.normalize("The.Matrix.(1999).1080p.BluRay.x264.mkv"),
            ("The Matrix".to_string(), Some(1999))
        );
        assert_eq!(n.aggressive_clean("Some.Movie.2019.mp4", 4), "Some Movie");
        assert_eq!(n.strip_extension("Dr. Stone"), "Dr. Stone");
    }

    #[test]
    fn title_that_is_a_year_is_kept() {
        let n = normalizer();
        assert_eq!(n.normalize("1917"), ("1917".to_string(), None));
        assert_eq!(n.normalize("1917 (2019)"), ("1917".to_string(), Some(2019)));
    }

    #[test]
    fn removes_bracketed_tags() {
        let n = normalizer();
        let (cleaned, year) = n.normalize("[SubsPlease] Frieren {Remastered} (JPN)");
        assert_eq!(cleaned, "Frieren");
        assert_eq!(year, None);
    }

    #[test]
    fn aggressive_clean_truncates_after_noise_removal() {
        let n = normalizer();
        let dir = "[Group] Some.Long.Movie.Name.2019.1080p.WEB-DL.x264-GRP";
        assert_eq!(n.aggressive_clean(dir, 4), "Some Long Movie Name");
        assert_eq!(n.aggressive_clean(dir, 2), "Some Long");
        assert_eq!(n.aggressive_clean("Show.S01E03.720p", 4), "Show");
    }

    #[test]
    fn extract_title_cuts_at_first_metadata_token() {
        let n = normalizer();
        assert_eq!(n.extract_title("Breaking.Bad.S01E01.720p.HDTV"), "Breaking Bad");
        assert_eq!(n.extract_title("[Grp] Mushishi (2005) [BD]"), "Mushishi");
        assert_eq!(n.extract_title("Arrival 2016 1080p"), "Arrival");
        assert_eq!(n.extract_title("Plain Title"), "Plain Title");
    }

    #[test]
    fn extract_title_falls_back_when_noise_leads() {
        let n = normalizer();
        assert_eq!(n.extract_title("1917 (2019)"), "1917");
    }

    #[test]
    fn strip_trailing_parenthetical() {
        let n = normalizer();
        assert_eq!(n.strip_trailing_parenthetical("Dark (2017) extra"), "Dark");
        assert_eq!(n.strip_trailing_parenthetical("No Parens"), "No Parens");
    }

    #[test]
    fn remove_genre_names_keeps_title() {
        let n = normalizer();
        assert_eq!(n.remove_genre_names("Cowboy Bebop Anime Action"), "Cowboy Bebop");
        assert_eq!(n.remove_genre_names("Drama"), "Drama");
    }

    #[test]
    fn provider_query_lowercases_and_spells_out_ampersand() {
        let n = normalizer();
        assert_eq!(n.provider_query("  The   Wire "), "the wire");
        assert_eq!(n.provider_query("Fast & Furious"), "fast and furious");
    }

    #[test]
    fn trivial_queries() {
        assert!(is_trivial_query(""));
        assert!(is_trivial_query(" a "));
        assert!(!is_trivial_query("Up"));
    }

    #[test]
    fn builds_query() {
        let n = normalizer();
        let q = n.query(" Heat (1995) ", MediaKind::Movie);
        assert_eq!(q.raw(), "Heat (1995)");
        assert_eq!(q.cleaned(), "Heat");
        assert_eq!(q.year(), Some(1995));
        assert_eq!(q.kind(), MediaKind::Movie);
    }
}
