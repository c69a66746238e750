//! Raw per-match input as supplied by the data collaborators
//!
//! Every optional bundle may be missing; the normalizer decides what counts
//! as present.

use crate::market::OddsTriple;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unvalidated match input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMatchInput {
    pub match_id: String,
    /// Feed sport key, e.g. `soccer_epl`
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    pub kickoff: Option<DateTime<Utc>>,
    #[serde(default)]
    pub home_stats: Option<RawTeamStats>,
    #[serde(default)]
    pub away_stats: Option<RawTeamStats>,
    /// Result string, most recent first (`"WWDLW"`)
    #[serde(default)]
    pub home_form: Option<String>,
    #[serde(default)]
    pub away_form: Option<String>,
    #[serde(default)]
    pub injuries: Option<Vec<RawInjury>>,
    #[serde(default)]
    pub h2h: Option<Vec<RawMeeting>>,
    #[serde(default)]
    pub home_rest_days: Option<u32>,
    #[serde(default)]
    pub away_rest_days: Option<u32>,
    #[serde(default)]
    pub away_travel_km: Option<f64>,
    #[serde(default)]
    pub odds: Option<OddsTriple>,
}

/// Season totals as reported by the stats feed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTeamStats {
    pub scored: Option<f64>,
    pub conceded: Option<f64>,
    pub played: Option<u32>,
}

/// Injury feed record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawInjury {
    pub player: String,
    pub status: String,
    /// `"home"` or `"away"`
    pub side: String,
}

/// A previous meeting between the two teams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMeeting {
    /// Goals of the current fixture's home team
    pub home_goals: u32,
    /// Goals of the current fixture's away team
    pub away_goals: u32,
}
