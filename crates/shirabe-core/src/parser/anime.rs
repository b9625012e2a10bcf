//! # Anime Filename Parser
//!
//! Ordered cascade of `(pattern, extractor)` rules. Rules are tried from most
//! to least specific and the first one that yields a result wins, so a bare
//! number is only read as an episode after every season-bearing form has
//! been ruled out.

use regex::{Captures, Regex};

use crate::error::Result;
use crate::types::{AnimeParseResult, PaddedNumber};

/// Pattern families in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternFamily {
    /// `Show - S01S02` season-plus-special.
    Special,
    /// `S01E02`, `Season 1 Episode 2`, `S01 - Title - 05` and variants.
    SeasonEpisode,
    /// `3rd Season - 05`, bare `S02`.
    OrdinalSeason,
    /// `Show 12v2`.
    VersionedEpisode,
    /// `Show 12`, `Show - 12`, `Show EP12`.
    TrailingNumber,
    /// Dash, bracket, `NxM` and `Ep` markers with an optional title suffix.
    Generic,
}

type Extractor = fn(&Captures<'_>) -> Option<AnimeParseResult>;

/// One matcher/extractor pair.
#[derive(Debug, Clone)]
struct Rule {
    family: PatternFamily,
    pattern: Regex,
    extract: Extractor,
}

impl Rule {
    fn new(family: PatternFamily, pattern: &str, extract: Extractor) -> Result<Self> {
        Ok(Self {
            family,
            pattern: Regex::new(&format!("(?i){pattern}"))?,
            extract,
        })
    }

    fn apply(&self, input: &str) -> Option<AnimeParseResult> {
        self.pattern
            .captures(input)
            .and_then(|caps| (self.extract)(&caps))
    }
}

/// Cascading anime filename parser.
///
/// Stateless after construction; safe to share across threads.
#[derive(Debug, Clone)]
pub struct AnimeParser {
    re_leading_group: Regex,
    re_crc_suffix: Regex,
    re_extension: Regex,
    re_square: Regex,
    re_round: Regex,
    re_whitespace: Regex,
    rules: Vec<Rule>,
}

impl AnimeParser {
    /// Constructs a new `AnimeParser` with the full rule cascade compiled.
    ///
    /// # Errors
    ///
    /// Returns `ShirabeError::RegexError` if any pattern fails to compile.
    pub fn new() -> Result<Self> {
        use PatternFamily::*;

        let rules = vec![
            Rule::new(
                Special,
                r"^(.+?)\s*-?\s*S(\d{1,2})S(\d{1,3})(?:[\s._-]|$)",
                special,
            )?,
            Rule::new(
                SeasonEpisode,
                r"^(.+?)[\s._-]+S(\d{1,2})[\s._-]?E(\d{1,4})(?:v\d+)?(?:\s+-\s+(.+)|[\s._-].*)?$",
                season_episode,
            )?,
            Rule::new(
                SeasonEpisode,
                r"^(.+?)[\s._-]*Season[\s._-]*(\d{1,2})[\s._-]*Episode[\s._-]*(\d{1,4})",
                season_episode,
            )?,
            Rule::new(
                SeasonEpisode,
                r"^(.+?)[\s._-]+S(\d{1,2})\s*-\s*(\d{1,4})$",
                season_episode,
            )?,
            Rule::new(
                SeasonEpisode,
                r"^(.+?)[\s._-]+S(\d{1,2})\s*-\s*(?:.+?)\s*-\s*(\d{1,4})$",
                season_episode,
            )?,
            Rule::new(
                SeasonEpisode,
                r"^(.+?)[\s._-]+Season[\s._]*(\d{1,2})[\s._-]+(\d{1,4})(?:[\s._-]|$)",
                season_episode,
            )?,
            Rule::new(
                OrdinalSeason,
                r"^(.+?)[\s._-]+(\d{1,2})(?:st|nd|rd|th)[\s._-]+Season[\s._-]*(\d{1,4})(?:[\s._-]|$)",
                season_episode,
            )?,
            Rule::new(
                OrdinalSeason,
                r"^(.+?)[\s._-]+(\d{1,2})(?:st|nd|rd|th)[\s._-]+Season.*?[-_]\s*(\d{1,4})(?:[\s._-]|$)",
                season_episode,
            )?,
            Rule::new(
                OrdinalSeason,
                r"^(.+?)[\s._-]+(\d{1,2})(?:st|nd|rd|th)[\s._-]+Season(?:[\s._-]|$)",
                season_only,
            )?,
            Rule::new(
                OrdinalSeason,
                r"^(.+?)[\s._-]+S(\d{1,2})(?:[\s._-]|$)",
                season_only,
            )?,
            Rule::new(
                VersionedEpisode,
                r"^(.+?)[\s._-]+(\d{1,4})v\d+(?:[\s._-].*)?$",
                episode_only,
            )?,
            Rule::new(TrailingNumber, r"^(.+?)\s*-\s*(\d{1,4})$", trailing_episode)?,
            Rule::new(TrailingNumber, r"^(.+?)[\s._]+(\d{1,4})$", trailing_episode)?,
            Rule::new(
                TrailingNumber,
                r"^(.+?)[\s._-]*\bEP?\.?\s*(\d{1,4})$",
                trailing_episode,
            )?,
            Rule::new(
                Generic,
                r"^(.+?)\s*-\s*(\d{1,4})(?:v\d+)?\s*-\s*(.+)$",
                episode_only,
            )?,
            Rule::new(
                Generic,
                r"^(.+?)[\s._-]*\b(\d{1,2})x(\d{1,3})\b(?:\s*-\s*(.+)|[\s._].*)?$",
                season_episode,
            )?,
            Rule::new(
                Generic,
                r"^(.+?)[\s._-]*\b(?:Ep\.?|Episode)\s*(\d{1,4})(?:\s*-\s*(.+))?$",
                episode_only,
            )?,
            Rule::new(
                Generic,
                r"^(.+?)\s*\[(\d{1,4})\](?:\s*-\s*(.+))?$",
                episode_only,
            )?,
        ];

        Ok(Self {
            re_leading_group: Regex::new(r"^\s*\[[^\]]*\]\s*")?,
            re_crc_suffix: Regex::new(r"\[[0-9A-Fa-f]{8}\](?:\.[A-Za-z0-9]{2,4})?$")?,
            re_extension: Regex::new(
                r"(?i)\.(?:mkv|mp4|avi|m4v|mov|wmv|flv|webm|ts|m2ts|ogm|rmvb)$",
            )?,
            re_square: Regex::new(r"\[([^\]]*)\]")?,
            re_round: Regex::new(r"\([^\)]*\)")?,
            re_whitespace: Regex::new(r"\s+")?,
            rules,
        })
    }

    /// Parses a filename into show/season/episode fields.
    ///
    /// Returns `None` when no rule matches; the caller then treats the
    /// name as a plain (non-anime) title.
    #[must_use]
    pub fn parse(&self, filename: &str) -> Option<AnimeParseResult> {
        self.parse_with_family(filename).map(|(_, result)| result)
    }

    /// Like [`parse`](Self::parse), also reporting which family matched.
    #[must_use]
    pub fn parse_with_family(&self, filename: &str) -> Option<(PatternFamily, AnimeParseResult)> {
        let cleaned = self.pre_clean(filename);
        if cleaned.is_empty() {
            return None;
        }

        let hit = self
            .rules
            .iter()
            .find_map(|rule| rule.apply(&cleaned).map(|r| (rule.family, r)));

        match &hit {
            Some((family, result)) => {
                tracing::trace!(input = filename, ?family, %result, "anime pattern matched");
            }
            None => tracing::trace!(input = filename, "no anime pattern matched"),
        }
        hit
    }

    /// Strips release-group tags, checksums, extensions and non-numeric
    /// bracketed or parenthesized tags.
    fn pre_clean(&self, filename: &str) -> String {
        let work = self.re_leading_group.replace(filename.trim(), "");
        let work = self.re_crc_suffix.replace(&work, "");
        let work = self.re_extension.replace(&work, "");
        let work = self.re_square.replace_all(&work, |caps: &Captures<'_>| {
            let inner = caps[1].trim();
            if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
                format!("[{inner}]")
            } else {
                " ".to_string()
            }
        });
        let work = self.re_round.replace_all(&work, " ");
        self.re_whitespace.replace_all(&work, " ").trim().to_string()
    }
}

/// Turns `.`, `_` and `-` into spaces and trims; `None` if nothing remains.
fn show_name(caps: &Captures<'_>) -> Option<String> {
    let raw = caps.get(1)?.as_str().replace(['.', '_', '-'], " ");
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!name.is_empty()).then_some(name)
}

fn number(caps: &Captures<'_>, group: usize) -> Option<PaddedNumber> {
    caps.get(group)
        .and_then(|m| PaddedNumber::parse(m.as_str()).ok())
}

fn title(caps: &Captures<'_>, group: usize) -> Option<String> {
    caps.get(group)
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn special(caps: &Captures<'_>) -> Option<AnimeParseResult> {
    let mut result = AnimeParseResult::new(show_name(caps)?);
    result.season_number = Some(number(caps, 2)?);
    result.episode_number = Some(number(caps, 3)?);
    result.is_extra = true;
    Some(result)
}

fn season_episode(caps: &Captures<'_>) -> Option<AnimeParseResult> {
    let mut result = AnimeParseResult::new(show_name(caps)?);
    result.season_number = Some(number(caps, 2)?);
    result.episode_number = Some(number(caps, 3)?);
    result.episode_title = title(caps, 4);
    Some(result)
}

fn season_only(caps: &Captures<'_>) -> Option<AnimeParseResult> {
    let mut result = AnimeParseResult::new(show_name(caps)?);
    result.season_number = Some(number(caps, 2)?);
    Some(result)
}

fn episode_only(caps: &Captures<'_>) -> Option<AnimeParseResult> {
    let mut result = AnimeParseResult::new(show_name(caps)?);
    result.episode_number = Some(number(caps, 2)?);
    result.episode_title = title(caps, 3);
    Some(result)
}

/// A trailing `19xx`/`20xx` number is a year (or a title like "2049"), not
/// an episode; let the cascade move on.
fn trailing_episode(caps: &Captures<'_>) -> Option<AnimeParseResult> {
    let digits = caps.get(2)?.as_str();
    if digits.len() == 4 && (digits.starts_with("19") || digits.starts_with("20")) {
        return None;
    }
    episode_only(caps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> AnimeParser {
        AnimeParser::new().unwrap()
    }

    fn fields(r: &AnimeParseResult) -> (String, Option<String>, Option<String>, bool) {
        (
            r.show_name.clone(),
            r.season_number.map(|n| n.to_string()),
            r.episode_number.map(|n| n.to_string()),
            r.is_extra,
        )
    }

    #[test]
    fn special_pattern_sets_extra() {
        let (family, r) = parser().parse_with_family("Show S01S02").unwrap();
        assert_eq!(family, PatternFamily::Special);
        assert_eq!(
            fields(&r),
            ("Show".into(), Some("01".into()), Some("02".into()), true)
        );
    }

    #[test]
    fn dash_number_is_episode_without_season() {
        let (family, r) = parser().parse_with_family("Show - 12").unwrap();
        assert_eq!(family, PatternFamily::TrailingNumber);
        assert_eq!(fields(&r), ("Show".into(), None, Some("12".into()), false));
    }

    #[test]
    fn ordinal_season_with_episode() {
        let (family, r) = parser().parse_with_family("Show 3rd Season - 05").unwrap();
        assert_eq!(family, PatternFamily::OrdinalSeason);
        assert_eq!(
            fields(&r),
            ("Show".into(), Some("03".into()), Some("05".into()), false)
        );
    }

    #[test]
    fn scene_style_season_episode() {
        let p = parser();
        let r = p.parse("Attack on Titan S04E01").unwrap();
        assert_eq!(
            fields(&r),
            ("Attack on Titan".into(), Some("04".into()), Some("01".into()), false)
        );

        let r = p.parse("Attack.on.Titan.S04E01.1080p.WEB.mkv").unwrap();
        assert_eq!(r.show_name, "Attack on Titan");
        assert_eq!(r.episode_number.map(|n| n.value()), Some(1));
    }

    #[test]
    fn season_episode_title_suffix() {
        let r = parser().parse("Show S01E05 - The Title").unwrap();
        assert_eq!(r.episode_title.as_deref(), Some("The Title"));
    }

    #[test]
    fn release_group_and_checksum_are_stripped() {
        let r = parser()
            .parse("[SubsPlease] Jujutsu Kaisen - 24 (1080p) [A1B2C3D4].mkv")
            .unwrap();
        assert_eq!(
            fields(&r),
            ("Jujutsu Kaisen".into(), None, Some("24".into()), false)
        );
    }

    #[test]
    fn season_word_variants() {
        let p = parser();
        let r = p.parse("Show Season 2 Episode 7").unwrap();
        assert_eq!(r.season_number.map(|n| n.value()), Some(2));
        assert_eq!(r.episode_number.map(|n| n.value()), Some(7));

        let r = p.parse("Show S2 - 07").unwrap();
        assert_eq!(r.season_number.map(|n| n.to_string()).as_deref(), Some("02"));
        assert_eq!(r.episode_number.map(|n| n.to_string()).as_deref(), Some("07"));
    }

    #[test]
    fn season_without_episode() {
        let (family, r) = parser().parse_with_family("Show 2nd Season").unwrap();
        assert_eq!(family, PatternFamily::OrdinalSeason);
        assert_eq!(r.season_number.map(|n| n.value()), Some(2));
        assert_eq!(r.episode_number, None);
    }

    #[test]
    fn versioned_episode() {
        let (family, r) = parser().parse_with_family("Show 05v2").unwrap();
        assert_eq!(family, PatternFamily::VersionedEpisode);
        assert_eq!(r.episode_number.map(|n| n.value()), Some(5));
    }

    #[test]
    fn generic_patterns() {
        let p = parser();

        let (family, r) = p.parse_with_family("Show - 03 - The Title").unwrap();
        assert_eq!(family, PatternFamily::Generic);
        assert_eq!(r.episode_number.map(|n| n.value()), Some(3));
        assert_eq!(r.episode_title.as_deref(), Some("The Title"));

        let r = p.parse("Show 2x05").unwrap();
        assert_eq!(r.season_number.map(|n| n.value()), Some(2));
        assert_eq!(r.episode_number.map(|n| n.value()), Some(5));

        let r = p.parse("Show [07]").unwrap();
        assert_eq!(r.show_name, "Show");
        assert_eq!(r.episode_number.map(|n| n.value()), Some(7));
    }

    #[test]
    fn trailing_year_is_not_an_episode() {
        let p = parser();
        assert!(p.parse("Show 2019").is_none());
        assert!(p.parse("Blade Runner 2049.mkv").is_none());
        assert!(p.parse("Space Odyssey - 2001").is_none());

        let r = p.parse("One Piece - 1084").unwrap();
        assert_eq!(r.episode_number.map(|n| n.value()), Some(1084));
    }

    #[test]
    fn season_with_title_and_episode() {
        let (family, r) = parser().parse_with_family("Show S01 - Title - 05").unwrap();
        assert_eq!(family, PatternFamily::SeasonEpisode);
        assert_eq!(
            fields(&r),
            ("Show".into(), Some("01".into()), Some("05".into()), false)
        );
    }

    #[test]
    fn no_pattern_returns_none() {
        let p = parser();
        assert!(p.parse("Random Movie Title").is_none());
        assert!(p.parse("").is_none());
        assert!(p.parse("[Group]").is_none());
    }
}
