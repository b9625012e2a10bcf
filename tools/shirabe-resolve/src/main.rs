//! Media identity resolver
//!
//! Resolves a title or a media file name to a TMDB record, prompting on the
//! terminal when several candidates fit.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, ValueEnum};
use shirabe_core::{DirectId, ResolvedMedia};
use shirabe_resolver::{Disambiguation, Outcome, ResolveRequest, ResolverConfig, ResolverContext};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Exit status when nothing matched.
const EXIT_UNRESOLVED: u8 = 2;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Movie,
    Tv,
}

/// CLI arguments
#[derive(Parser)]
#[command(name = "shirabe-resolve")]
#[command(about = "Resolve media names to TMDB identities")]
#[command(version)]
#[command(group(ArgGroup::new("input").required(true).args(["query", "file"])))]
#[command(group(ArgGroup::new("direct").args(["tmdb_id", "imdb_id", "tvdb_id"])))]
struct Cli {
    /// Title to resolve
    query: Option<String>,

    /// Resolve a media file name instead (kind is detected from the name)
    #[arg(short, long)]
    file: Option<String>,

    /// Catalogue to search for a title query
    #[arg(short, long, value_enum, default_value_t = KindArg::Tv)]
    kind: KindArg,

    /// Release or first-air year
    #[arg(short, long)]
    year: Option<u16>,

    /// Take the best candidate without asking
    #[arg(short, long)]
    auto: bool,

    /// Look up this TMDB ID directly
    #[arg(long)]
    tmdb_id: Option<u64>,

    /// Look up this IMDb ID (e.g. tt0944947) through TMDB
    #[arg(long)]
    imdb_id: Option<String>,

    /// Look up this TVDB ID through TMDB
    #[arg(long)]
    tvdb_id: Option<u64>,

    /// Name of the directory holding the file, used by late fallbacks
    #[arg(short, long)]
    parent_dir: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Skip the website search page fallback
    #[arg(long)]
    no_scrape: bool,

    /// TMDB API key
    #[arg(long, env = "TMDB_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Result language, as a name (Japanese) or locale (ja-JP)
    #[arg(short, long, env = "TMDB_LANGUAGE")]
    language: Option<String>,
}

impl Cli {
    fn direct_id(&self) -> Option<DirectId> {
        if let Some(id) = self.tmdb_id {
            return Some(DirectId::Provider(id));
        }
        if let Some(ref id) = self.imdb_id {
            return Some(DirectId::Imdb(id.trim().to_string()));
        }
        self.tvdb_id.map(DirectId::Tvdb)
    }

    fn config(&self) -> ResolverConfig {
        let mut config = ResolverConfig::from_env().with_scrape_fallback(!self.no_scrape);
        if let Some(ref key) = self.api_key {
            config = config.with_api_key(key.as_str());
        }
        if let Some(ref language) = self.language {
            config = config.with_language(language.as_str());
        }
        config
    }

    fn request(&self, query: &str) -> ResolveRequest {
        let request = match self.kind {
            KindArg::Movie => ResolveRequest::movie(query),
            KindArg::Tv => ResolveRequest::show(query),
        };
        let mut request = request.with_year(self.year).with_auto_select(self.auto);
        request.direct_id = self.direct_id();
        request.parent_dir = self.parent_dir.clone();
        request
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    info!(locale = config.locale(), "starting resolver");

    let ctx = ResolverContext::new(config).context("failed to set up the resolver")?;

    let mut outcome = match (&cli.file, &cli.query) {
        (Some(file), _) => ctx
            .resolve_file(file, cli.parent_dir.as_deref(), cli.auto)
            .with_context(|| format!("failed to resolve {file}"))?,
        (None, Some(query)) => ctx
            .resolve(cli.request(query))
            .with_context(|| format!("failed to resolve {query}"))?,
        (None, None) => anyhow::bail!("nothing to resolve"),
    };

    loop {
        outcome = match outcome {
            Outcome::Resolved(media) => {
                print_media(&media, cli.json)?;
                return Ok(ExitCode::SUCCESS);
            }
            Outcome::Unresolved(query) => {
                warn!(query = %query, "no match found");
                println!("{query}");
                return Ok(ExitCode::from(EXIT_UNRESOLVED));
            }
            Outcome::NeedsDisambiguation(pending) => {
                let answer = prompt(&pending).context("failed to read selection")?;
                let selection = pending.selection(&answer);
                ctx.resume(pending, selection)
                    .context("failed to apply selection")?
            }
        };
    }
}

/// Lists the choices on stderr and reads one line. End of input picks the default.
fn prompt(pending: &Disambiguation) -> Result<String> {
    let mut err = io::stderr().lock();
    writeln!(err, "Several matches for '{}':", pending.query().raw())?;
    for (i, choice) in pending.choices().iter().enumerate() {
        let c = &choice.candidate;
        let year = c.year().map(|y| format!(" ({y})")).unwrap_or_default();
        writeln!(
            err,
            "  {}. {}{year} [tmdb-{}] score {}",
            i + 1,
            c.display_name,
            c.provider_id,
            choice.score
        )?;
    }
    write!(
        err,
        "Pick 1-{}, type a new search, or press Enter for 1: ",
        pending.choices().len()
    )?;
    err.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

fn print_media(media: &ResolvedMedia, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(media)?);
    } else {
        println!("{media}");
    }
    Ok(())
}
