use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use shirabe_core::{MediaKind, MediaParser, ParsedName, ParserConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Movie,
    Tv,
}

/// Reads one filename per line on stdin and prints one JSON object per line.
#[derive(Parser)]
#[command(name = "shirabe-parse")]
#[command(version)]
struct Cli {
    /// Force the classification instead of letting the anime cascade decide
    #[arg(short, long, value_enum)]
    kind: Option<KindArg>,

    /// Pretty-print each object
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Serialize)]
struct ParseOutput {
    input: String,
    kind: Option<MediaKind>,
    family: Option<String>,
    show_name: Option<String>,
    season: Option<String>,
    episode: Option<String>,
    episode_title: Option<String>,
    is_extra: bool,
    cleaned: String,
    year: Option<u16>,
    extracted_title: String,
    error: Option<String>,
}

fn describe(parser: &MediaParser, line: &str) -> ParseOutput {
    let (cleaned, year) = parser.normalizer().normalize(line);
    let mut output = ParseOutput {
        input: line.to_string(),
        kind: None,
        family: None,
        show_name: None,
        season: None,
        episode: None,
        episode_title: None,
        is_extra: false,
        cleaned,
        year,
        extracted_title: parser.normalizer().extract_title(line),
        error: None,
    };

    match parser.parse(line) {
        Ok(parsed) => {
            output.kind = Some(parsed.kind());
            if let ParsedName::Show(show) = parsed {
                output.family = parser
                    .anime()
                    .parse_with_family(line)
                    .map(|(family, _)| format!("{family:?}"));
                output.season = show.season_number.map(|n| n.to_string());
                output.episode = show.episode_number.map(|n| n.to_string());
                output.episode_title = show.episode_title;
                output.is_extra = show.is_extra;
                output.show_name = Some(show.show_name);
            }
        }
        Err(e) => output.error = Some(e.to_string()),
    }
    output
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ParserConfig::new();
    if let Some(kind) = cli.kind {
        config = config.with_kind(match kind {
            KindArg::Movie => MediaKind::Movie,
            KindArg::Tv => MediaKind::Tv,
        });
    }
    let parser = MediaParser::new(config).context("failed to build parser")?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let output = describe(&parser, line);
        let json = if cli.pretty {
            serde_json::to_string_pretty(&output)?
        } else {
            serde_json::to_string(&output)?
        };
        writeln!(out, "{json}")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anime_line_reports_episode_fields() {
        let parser = MediaParser::with_defaults().unwrap();
        let out = describe(&parser, "[SubsPlease] Jujutsu Kaisen - 24 (1080p) [ABCD1234].mkv");
        assert_eq!(out.kind, Some(MediaKind::Tv));
        assert_eq!(out.show_name.as_deref(), Some("Jujutsu Kaisen"));
        assert_eq!(out.episode.as_deref(), Some("24"));
        assert_eq!(out.family.as_deref(), Some("TrailingNumber"));
    }

    #[test]
    fn movie_line_reports_normalized_title() {
        let parser = MediaParser::with_defaults().unwrap();
        let out = describe(&parser, "Heat.1995.1080p.BluRay.x264.mkv");
        assert_eq!(out.kind, Some(MediaKind::Movie));
        assert_eq!(out.cleaned, "Heat");
        assert_eq!(out.year, Some(1995));
        assert!(out.show_name.is_none());
    }
}
