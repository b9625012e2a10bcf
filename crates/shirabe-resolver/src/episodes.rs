//! Episode-level post-processing applied on top of a resolved show.

use shirabe_core::{EpisodeContext, MediaKind, PaddedNumber, ResolvedMedia};

use crate::provider::{MetadataProvider, SeasonSummary};

/// Maps an absolute episode number onto `(season, episode)` by walking the
/// regular seasons (specials in season 0 are skipped) in order.
pub fn map_absolute_episode(seasons: &[SeasonSummary], absolute: u32) -> Option<(u32, u32)> {
    if absolute == 0 {
        return None;
    }
    let mut regular: Vec<&SeasonSummary> = seasons.iter().filter(|s| s.number > 0).collect();
    regular.sort_by_key(|s| s.number);

    let mut remaining = absolute;
    for season in regular {
        if remaining <= season.episode_count {
            return Some((season.number, remaining));
        }
        remaining -= season.episode_count;
    }
    None
}

/// Applies `ctx` to a show-level identity.
///
/// Movies come back unchanged; see [`complete_episode`] for shows.
pub fn apply_episode(
    provider: &dyn MetadataProvider,
    show: &ResolvedMedia,
    ctx: &EpisodeContext,
) -> ResolvedMedia {
    if show.kind != MediaKind::Tv {
        return show.clone();
    }
    show.with_episode(&complete_episode(provider, show, ctx))
}

/// Fills in what the filename left out of `ctx` for a show.
///
/// Anime episodes without a season are mapped from absolute numbering,
/// defaulting to season 1. Regular episodes with both numbers get their
/// title from the provider unless one was parsed. Provider failures here
/// never fail the resolution; the fields are just left empty.
pub fn complete_episode(
    provider: &dyn MetadataProvider,
    show: &ResolvedMedia,
    ctx: &EpisodeContext,
) -> EpisodeContext {
    let mut ctx = ctx.clone();

    if show.is_anime_genre && ctx.season.is_none() && !ctx.is_extra {
        if let Some(absolute) = ctx.episode {
            match provider.seasons(show.provider_id) {
                Ok(seasons) => match map_absolute_episode(&seasons, absolute.value()) {
                    Some((season, episode)) => {
                        tracing::debug!(
                            show = %show.canonical_name,
                            absolute = absolute.value(),
                            season,
                            episode,
                            "mapped absolute episode"
                        );
                        ctx.season = Some(PaddedNumber::new(season));
                        ctx.episode = Some(PaddedNumber::new(episode));
                    }
                    None => ctx.season = Some(PaddedNumber::new(1)),
                },
                Err(err) => {
                    tracing::debug!(error = %err, "season list unavailable");
                    ctx.season = Some(PaddedNumber::new(1));
                }
            }
        }
    }

    if !ctx.is_extra && ctx.episode_title.is_none() {
        if let (Some(season), Some(episode)) = (ctx.season, ctx.episode) {
            match provider.episode_title(show.provider_id, season.value(), episode.value()) {
                Ok(title) => ctx.episode_title = title,
                Err(err) => tracing::debug!(error = %err, "episode title unavailable"),
            }
        }
    }

    ctx
}
