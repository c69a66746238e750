//! Normalized signal types

use crate::market::OddsTriple;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Sport of a fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Soccer,
    Basketball,
    Hockey,
    Football,
    Other,
}

impl Sport {
    /// Map a feed sport key (e.g. `soccer_epl`, `icehockey_nhl`) to a sport
    pub fn from_key(key: &str) -> Self {
        let key = key.trim().to_ascii_lowercase();
        if key.starts_with("soccer") {
            Sport::Soccer
        } else if key.starts_with("basketball") {
            Sport::Basketball
        } else if key.starts_with("icehockey") || key.starts_with("hockey") {
            Sport::Hockey
        } else if key.starts_with("americanfootball") || key.starts_with("football") {
            Sport::Football
        } else {
            Sport::Other
        }
    }

    /// Outcome space for this sport.
    ///
    /// `Other` has no fixed space; it is three-way only when the bookmaker
    /// prices a draw.
    pub fn outcome_space(&self, draw_priced: bool) -> OutcomeSpace {
        match self {
            Sport::Soccer => OutcomeSpace::ThreeWay,
            Sport::Basketball | Sport::Hockey | Sport::Football => OutcomeSpace::TwoWay,
            Sport::Other if draw_priced => OutcomeSpace::ThreeWay,
            Sport::Other => OutcomeSpace::TwoWay,
        }
    }

    /// Logistic scale applied to per-game net scoring differentials.
    ///
    /// Scoring volume differs by orders of magnitude between sports, so a
    /// one-unit differential means very different things.
    pub fn rating_scale(&self) -> f64 {
        match self {
            Sport::Soccer => 1.0,
            Sport::Hockey => 0.9,
            Sport::Basketball => 0.08,
            Sport::Football => 0.12,
            Sport::Other => 0.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Soccer => "soccer",
            Sport::Basketball => "basketball",
            Sport::Hockey => "hockey",
            Sport::Football => "football",
            Sport::Other => "other",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a draw is a possible result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeSpace {
    TwoWay,
    ThreeWay,
}

impl OutcomeSpace {
    pub fn outcomes(&self) -> &'static [Outcome] {
        match self {
            OutcomeSpace::TwoWay => &[Outcome::Home, Outcome::Away],
            OutcomeSpace::ThreeWay => &[Outcome::Home, Outcome::Draw, Outcome::Away],
        }
    }

    pub fn allows_draw(&self) -> bool {
        matches!(self, OutcomeSpace::ThreeWay)
    }
}

/// A match outcome a prediction can select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Home => "home",
            Outcome::Draw => "draw",
            Outcome::Away => "away",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical team identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(String);

impl TeamId {
    /// Slug a display name into an identifier: lowercase, alphanumeric runs
    /// joined by single hyphens. Returns `None` if nothing is left.
    pub fn from_name(name: &str) -> Option<Self> {
        let mut slug = String::with_capacity(name.len());
        for part in name
            .split(|c: char| !c.is_alphanumeric())
            .filter(|p| !p.is_empty())
        {
            if !slug.is_empty() {
                slug.push('-');
            }
            slug.extend(part.chars().flat_map(char::to_lowercase));
        }
        if slug.is_empty() {
            None
        } else {
            Some(Self(slug))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Home or away side of a fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    Home,
    Away,
}

/// Home and away values of the same measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerSide<T> {
    pub home: T,
    pub away: T,
}

/// One recent result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormResult {
    Win,
    Draw,
    Loss,
}

impl FormResult {
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'W' => Some(FormResult::Win),
            'D' => Some(FormResult::Draw),
            'L' => Some(FormResult::Loss),
            _ => None,
        }
    }

    pub fn points(&self) -> u32 {
        match self {
            FormResult::Win => 3,
            FormResult::Draw => 1,
            FormResult::Loss => 0,
        }
    }
}

/// Recent results of one team, most recent first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamForm {
    pub results: Vec<FormResult>,
}

impl TeamForm {
    /// Points per game scaled to 0..=1
    pub fn score(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        let points: u32 = self.results.iter().map(FormResult::points).sum();
        points as f64 / (3.0 * self.results.len() as f64)
    }
}

/// Season scoring totals of one team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonStats {
    pub scored: f64,
    pub conceded: f64,
    pub played: u32,
}

impl SeasonStats {
    pub fn scored_per_game(&self) -> f64 {
        self.scored / self.played as f64
    }

    pub fn conceded_per_game(&self) -> f64 {
        self.conceded / self.played as f64
    }

    /// Scored minus conceded per game
    pub fn net_rate(&self) -> f64 {
        self.scored_per_game() - self.conceded_per_game()
    }
}

/// How badly a player absence hurts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjurySeverity {
    Out,
    Doubtful,
    Questionable,
    Minor,
}

impl InjurySeverity {
    pub fn from_status(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "out" | "injured" | "suspended" | "ir" => InjurySeverity::Out,
            "doubtful" => InjurySeverity::Doubtful,
            "questionable" | "day-to-day" | "gtd" => InjurySeverity::Questionable,
            _ => InjurySeverity::Minor,
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            InjurySeverity::Out => 1.0,
            InjurySeverity::Doubtful => 0.6,
            InjurySeverity::Questionable => 0.3,
            InjurySeverity::Minor => 0.1,
        }
    }
}

/// A reported absence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Injury {
    pub player: String,
    pub severity: InjurySeverity,
    pub side: TeamSide,
}

/// Result of a previous meeting, from the current fixture's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum H2hResult {
    HomeWin,
    Draw,
    AwayWin,
}

/// Rest and travel context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestContext {
    pub home_rest_days: u32,
    pub away_rest_days: u32,
    pub away_travel_km: Option<f64>,
}

/// Which input dimensions were actually present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAvailability {
    pub form: bool,
    pub season_stats: bool,
    pub injuries: bool,
    pub h2h: bool,
    pub rest: bool,
    pub market_odds: bool,
}

impl DataAvailability {
    const DIMENSIONS: usize = 6;

    /// Fraction of dimensions present
    pub fn completeness(&self) -> f64 {
        let present = [
            self.form,
            self.season_stats,
            self.injuries,
            self.h2h,
            self.rest,
            self.market_odds,
        ]
        .iter()
        .filter(|p| **p)
        .count();
        present as f64 / Self::DIMENSIONS as f64
    }

    /// Names of missing dimensions
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = vec![];
        for (present, name) in [
            (self.form, "form"),
            (self.season_stats, "season_stats"),
            (self.injuries, "injuries"),
            (self.h2h, "h2h"),
            (self.rest, "rest"),
            (self.market_odds, "market_odds"),
        ] {
            if !present {
                missing.push(name);
            }
        }
        missing
    }
}

/// Uniform per-match signal bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversalSignals {
    pub match_id: String,
    pub sport: Sport,
    pub outcome_space: OutcomeSpace,
    pub home: TeamId,
    pub away: TeamId,
    pub kickoff: DateTime<Utc>,
    pub form: Option<PerSide<TeamForm>>,
    pub season_stats: Option<PerSide<SeasonStats>>,
    pub injuries: Option<Vec<Injury>>,
    pub h2h: Option<Vec<H2hResult>>,
    pub rest: Option<RestContext>,
    pub market_odds: Option<OddsTriple>,
    pub availability: DataAvailability,
}

impl UniversalSignals {
    /// Summed injury severity for one side, `None` when injuries are unknown
    pub fn injury_load(&self, side: TeamSide) -> Option<f64> {
        let injuries = self.injuries.as_ref()?;
        Some(
            injuries
                .iter()
                .filter(|i| i.side == side)
                .map(|i| i.severity.weight())
                .sum(),
        )
    }
}

/// Normalization errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    /// A required input is missing or unusable
    #[error("Input incomplete: {field}")]
    InputIncomplete { field: &'static str },
    /// Both sides resolved to the same team
    #[error("Home and away resolve to the same team: {0}")]
    SameTeam(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sport_from_key() {
        assert_eq!(Sport::from_key("soccer_epl"), Sport::Soccer);
        assert_eq!(Sport::from_key("basketball_nba"), Sport::Basketball);
        assert_eq!(Sport::from_key("icehockey_nhl"), Sport::Hockey);
        assert_eq!(Sport::from_key("americanfootball_nfl"), Sport::Football);
        assert_eq!(Sport::from_key("cricket_ipl"), Sport::Other);
        assert_eq!(Sport::from_key("  SOCCER "), Sport::Soccer);
    }

    #[test]
    fn test_outcome_space_by_sport() {
        assert_eq!(Sport::Soccer.outcome_space(false), OutcomeSpace::ThreeWay);
        assert_eq!(Sport::Basketball.outcome_space(true), OutcomeSpace::TwoWay);
        assert_eq!(Sport::Other.outcome_space(true), OutcomeSpace::ThreeWay);
        assert_eq!(Sport::Other.outcome_space(false), OutcomeSpace::TwoWay);
        assert_eq!(OutcomeSpace::TwoWay.outcomes().len(), 2);
        assert!(OutcomeSpace::ThreeWay.allows_draw());
    }

    #[test]
    fn test_team_id_slug() {
        let id = TeamId::from_name("  Manchester   United F.C. ").unwrap();
        assert_eq!(id.as_str(), "manchester-united-f-c");
        assert!(TeamId::from_name(" -- ").is_none());
    }

    #[test]
    fn test_form_score() {
        let form = TeamForm {
            results: vec![FormResult::Win, FormResult::Draw, FormResult::Loss],
        };
        // 4 points from a possible 9
        assert!((form.score() - 4.0 / 9.0).abs() < 1e-9);
        assert_eq!(TeamForm { results: vec![] }.score(), 0.0);
    }

    #[test]
    fn test_injury_severity_from_status() {
        assert_eq!(InjurySeverity::from_status("OUT"), InjurySeverity::Out);
        assert_eq!(InjurySeverity::from_status("Doubtful"), InjurySeverity::Doubtful);
        assert_eq!(InjurySeverity::from_status("GTD"), InjurySeverity::Questionable);
        assert_eq!(InjurySeverity::from_status("knock"), InjurySeverity::Minor);
    }

    #[test]
    fn test_availability_completeness() {
        let availability = DataAvailability {
            form: true,
            season_stats: true,
            injuries: false,
            h2h: false,
            rest: true,
            market_odds: false,
        };
        assert!((availability.completeness() - 0.5).abs() < 1e-9);
        assert_eq!(availability.missing(), vec!["injuries", "h2h", "market_odds"]);
    }
}
