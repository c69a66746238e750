//! Signal normalization
//!
//! Maps raw per-sport input into [`UniversalSignals`]. Absent dimensions
//! stay absent and are flagged in [`DataAvailability`]; nothing is defaulted
//! to a neutral-looking zero.

use super::raw::{RawInjury, RawMatchInput, RawMeeting, RawTeamStats};
use super::types::{
    DataAvailability, FormResult, H2hResult, Injury, InjurySeverity, PerSide, RestContext,
    SeasonStats, SignalError, TeamForm, TeamId, TeamSide, UniversalSignals,
};
use super::Sport;
use crate::cache::TtlCache;
use crate::market::OddsTriple;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;

/// Only the most recent results count towards form
const FORM_WINDOW: usize = 5;

/// Resolves display names to canonical team identifiers
pub struct TeamResolver {
    aliases: HashMap<TeamId, TeamId>,
    cache: TtlCache<String, TeamId>,
}

impl TeamResolver {
    /// Create a resolver from an alias table (alias -> canonical name)
    pub fn new(aliases: &HashMap<String, String>, cache_capacity: usize, ttl: Duration) -> Self {
        let aliases = aliases
            .iter()
            .filter_map(|(alias, canonical)| {
                Some((TeamId::from_name(alias)?, TeamId::from_name(canonical)?))
            })
            .collect();
        Self {
            aliases,
            cache: TtlCache::new(cache_capacity, ttl),
        }
    }

    /// Resolve a display name, consulting the cache first
    pub fn resolve(&self, name: &str) -> Option<TeamId> {
        self.cache.get_or_insert_with(name.to_string(), || {
            let slug = TeamId::from_name(name)?;
            Some(self.aliases.get(&slug).cloned().unwrap_or(slug))
        })
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

/// Normalize with plain slug identifiers
pub fn normalize(raw: &RawMatchInput) -> Result<UniversalSignals, SignalError> {
    normalize_with(raw, TeamId::from_name)
}

/// Normalize, resolving team identifiers through `resolver`
pub fn normalize_resolved(
    raw: &RawMatchInput,
    resolver: &TeamResolver,
) -> Result<UniversalSignals, SignalError> {
    normalize_with(raw, |name| resolver.resolve(name))
}

fn normalize_with<F>(raw: &RawMatchInput, resolve: F) -> Result<UniversalSignals, SignalError>
where
    F: Fn(&str) -> Option<TeamId>,
{
    if raw.match_id.trim().is_empty() {
        return Err(SignalError::InputIncomplete { field: "match_id" });
    }
    if raw.sport.trim().is_empty() {
        return Err(SignalError::InputIncomplete { field: "sport" });
    }
    let home = resolve(&raw.home_team).ok_or(SignalError::InputIncomplete { field: "home_team" })?;
    let away = resolve(&raw.away_team).ok_or(SignalError::InputIncomplete { field: "away_team" })?;
    if home == away {
        return Err(SignalError::SameTeam(home.to_string()));
    }
    let kickoff = raw
        .kickoff
        .ok_or(SignalError::InputIncomplete { field: "kickoff" })?;

    let sport = Sport::from_key(&raw.sport);
    let draw_priced = raw
        .odds
        .as_ref()
        .and_then(|o| o.draw)
        .is_some_and(|d| d > Decimal::ONE);
    let outcome_space = sport.outcome_space(draw_priced);

    // A two-way space never carries draw odds downstream
    let market_odds = raw.odds.clone().map(|odds| OddsTriple {
        draw: if outcome_space.allows_draw() { odds.draw } else { None },
        ..odds
    });

    let form = match (parse_form(raw.home_form.as_deref()), parse_form(raw.away_form.as_deref())) {
        (Some(home), Some(away)) => Some(PerSide { home, away }),
        _ => None,
    };

    let season_stats = match (parse_stats(raw.home_stats.as_ref()), parse_stats(raw.away_stats.as_ref())) {
        (Some(home), Some(away)) => Some(PerSide { home, away }),
        _ => None,
    };

    let injuries = raw
        .injuries
        .as_ref()
        .and_then(|list| parse_injuries(&raw.match_id, list));

    let h2h = raw
        .h2h
        .as_ref()
        .filter(|meetings| !meetings.is_empty())
        .map(|meetings| meetings.iter().map(meeting_result).collect::<Vec<_>>());

    let rest = match (raw.home_rest_days, raw.away_rest_days) {
        (Some(home_rest_days), Some(away_rest_days)) => Some(RestContext {
            home_rest_days,
            away_rest_days,
            away_travel_km: raw.away_travel_km.filter(|km| km.is_finite() && *km >= 0.0),
        }),
        _ => None,
    };

    let availability = DataAvailability {
        form: form.is_some(),
        season_stats: season_stats.is_some(),
        injuries: injuries.is_some(),
        h2h: h2h.is_some(),
        rest: rest.is_some(),
        market_odds: market_odds.is_some(),
    };

    tracing::debug!(
        match_id = %raw.match_id,
        sport = %sport,
        completeness = availability.completeness(),
        missing = ?availability.missing(),
        "Normalized match signals"
    );

    Ok(UniversalSignals {
        match_id: raw.match_id.trim().to_string(),
        sport,
        outcome_space,
        home,
        away,
        kickoff,
        form,
        season_stats,
        injuries,
        h2h,
        rest,
        market_odds,
        availability,
    })
}

fn parse_form(raw: Option<&str>) -> Option<TeamForm> {
    let results: Vec<FormResult> = raw?
        .chars()
        .filter_map(FormResult::from_char)
        .take(FORM_WINDOW)
        .collect();
    if results.is_empty() {
        None
    } else {
        Some(TeamForm { results })
    }
}

fn parse_stats(raw: Option<&RawTeamStats>) -> Option<SeasonStats> {
    let raw = raw?;
    let valid = |v: f64| v.is_finite() && v >= 0.0;
    let scored = raw.scored.filter(|v| valid(*v))?;
    let conceded = raw.conceded.filter(|v| valid(*v))?;
    let played = raw.played.filter(|p| *p > 0)?;
    Some(SeasonStats {
        scored,
        conceded,
        played,
    })
}

/// An empty list is real data. A non-empty list with no usable record is not.
fn parse_injuries(match_id: &str, raw: &[RawInjury]) -> Option<Vec<Injury>> {
    let injuries: Vec<Injury> = raw
        .iter()
        .filter_map(|injury| {
            let side = match injury.side.trim().to_ascii_lowercase().as_str() {
                "home" => TeamSide::Home,
                "away" => TeamSide::Away,
                other => {
                    tracing::debug!(match_id, side = other, player = %injury.player, "Skipping injury with unknown side");
                    return None;
                }
            };
            Some(Injury {
                player: injury.player.clone(),
                severity: InjurySeverity::from_status(&injury.status),
                side,
            })
        })
        .collect();

    if injuries.is_empty() && !raw.is_empty() {
        tracing::debug!(match_id, listed = raw.len(), "No usable injury records");
        return None;
    }
    Some(injuries)
}

fn meeting_result(meeting: &RawMeeting) -> H2hResult {
    use std::cmp::Ordering;
    match meeting.home_goals.cmp(&meeting.away_goals) {
        Ordering::Greater => H2hResult::HomeWin,
        Ordering::Equal => H2hResult::Draw,
        Ordering::Less => H2hResult::AwayWin,
    }
}
