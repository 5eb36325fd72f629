use super::{Rejection, Slots};

pub const SEASON_RANGE: std::ops::RangeInclusive<u32> = 1..=99;
pub const EPISODE_RANGE: std::ops::RangeInclusive<u32> = 1..=999;

/// Resolve season and episode numbers from the captured slots.
///
/// Explicit season/episode captures take precedence. The compact form is
/// only consulted when neither was captured: three digits split 1+2, four
/// digits split 2+2.
pub fn resolve_season_episode(slots: &Slots) -> Result<(u32, u32), Rejection> {
    let season = slots
        .season
        .as_deref()
        .map(|raw| parse_in_range(raw, &SEASON_RANGE).ok_or_else(|| Rejection::Season(raw.into())))
        .transpose()?;
    let episode = slots
        .episode
        .as_deref()
        .map(|raw| {
            parse_in_range(raw, &EPISODE_RANGE).ok_or_else(|| Rejection::Episode(raw.into()))
        })
        .transpose()?;

    if season.is_none() && episode.is_none() {
        if let Some(compact) = slots.alt_episode.as_deref() {
            return split_compact(compact).ok_or_else(|| Rejection::Compact(compact.into()));
        }
    }

    match (season, episode) {
        (Some(season), Some(episode)) => Ok((season, episode)),
        _ => Err(Rejection::MissingSeasonEpisode),
    }
}

fn parse_in_range(raw: &str, range: &std::ops::RangeInclusive<u32>) -> Option<u32> {
    raw.parse().ok().filter(|n| range.contains(n))
}

/// Decode a compact "SEE" or "SSEE" token
fn split_compact(compact: &str) -> Option<(u32, u32)> {
    if !compact.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let boundary = match compact.len() {
        3 => 1,
        4 => 2,
        _ => return None,
    };
    let season: u32 = compact[..boundary].parse().ok()?;
    let episode: u32 = compact[boundary..].parse().ok()?;
    (season >= 1 && episode >= 1).then_some((season, episode))
}
