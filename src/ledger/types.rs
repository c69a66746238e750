//! Ledger types

use crate::edge::EdgeBucket;
use crate::market::{MarketProbability, OddsTriple};
use crate::model::ModelProbability;
use crate::pipeline::AnalysisSnapshot;
use crate::signal::{Outcome, Sport};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Ledger entry identifier
pub type LedgerId = Uuid;

/// Uniqueness key: one entry per match and model version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LedgerKey {
    pub match_id: String,
    pub model_version: String,
}

impl LedgerKey {
    pub fn new(match_id: impl Into<String>, model_version: impl Into<String>) -> Self {
        Self {
            match_id: match_id.into(),
            model_version: model_version.into(),
        }
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.match_id, self.model_version)
    }
}

/// Lifecycle state of a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredictionOutcome {
    Pending,
    Hit,
    Miss,
    Push,
}

impl PredictionOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PredictionOutcome::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionOutcome::Pending => "PENDING",
            PredictionOutcome::Hit => "HIT",
            PredictionOutcome::Miss => "MISS",
            PredictionOutcome::Push => "PUSH",
        }
    }
}

impl fmt::Display for PredictionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualScore {
    pub home: u32,
    pub away: u32,
}

impl ActualScore {
    /// Realized winner; `Draw` on a level score
    pub fn winner(&self) -> Outcome {
        use std::cmp::Ordering;
        match self.home.cmp(&self.away) {
            Ordering::Greater => Outcome::Home,
            Ordering::Equal => Outcome::Draw,
            Ordering::Less => Outcome::Away,
        }
    }
}

impl FromStr for ActualScore {
    type Err = String;

    /// Parse `"2-1"` or `"2:1"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (home, away) = s
            .trim()
            .split_once(['-', ':'])
            .ok_or_else(|| format!("no separator in score {:?}", s))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|e| format!("bad score {:?}: {}", s, e))
        };
        Ok(Self {
            home: parse(home)?,
            away: parse(away)?,
        })
    }
}

impl fmt::Display for ActualScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

/// An observed odds snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsSnapshot {
    pub odds: OddsTriple,
    pub observed_at: DateTime<Utc>,
}

/// What an odds snapshot changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OddsAttachment {
    pub opening_set: bool,
    pub closing_set: bool,
    pub clv_value: Option<f64>,
}

/// Settlement data accepted by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Resolution {
    /// Result known: `outcome` is HIT or MISS
    Settled {
        outcome: PredictionOutcome,
        score: ActualScore,
    },
    /// Match voided by the results collaborator
    Voided { reason: String },
}

impl Resolution {
    pub fn outcome(&self) -> PredictionOutcome {
        match self {
            Resolution::Settled { outcome, .. } => *outcome,
            Resolution::Voided { .. } => PredictionOutcome::Push,
        }
    }
}

/// Overwrite of corrupted fields, only applied through integrity repair
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairPatch {
    pub model_probability: Option<ModelProbability>,
    /// Raw and fair market probabilities
    pub market: Option<(Option<MarketProbability>, Option<MarketProbability>)>,
    pub edge: Option<(Option<f64>, EdgeBucket)>,
    /// Prediction timestamp of the entry the patch was planned against.
    /// When set, the patch is refused if the entry was re-recorded since.
    pub planned_against: Option<DateTime<Utc>>,
}

impl RepairPatch {
    pub fn is_empty(&self) -> bool {
        self.model_probability.is_none() && self.market.is_none() && self.edge.is_none()
    }
}

/// One overwritten field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: &'static str,
    pub before: String,
    pub after: String,
}

/// Durable record of one analysis and its settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionLedgerEntry {
    pub id: LedgerId,
    pub match_id: String,
    pub model_version: String,
    pub sport: Sport,
    pub selection: Outcome,

    /// Inputs and outputs exactly as analyzed
    pub snapshot: AnalysisSnapshot,

    pub model_probability: ModelProbability,
    pub market_probability_raw: Option<MarketProbability>,
    pub market_probability_fair: Option<MarketProbability>,
    pub market_odds_at_prediction: Option<OddsTriple>,
    pub edge_value: Option<f64>,
    pub edge_bucket: EdgeBucket,

    pub prediction_timestamp: DateTime<Utc>,
    pub kickoff: DateTime<Utc>,

    /// Selection price in the first snapshot observed
    pub opening_odds: Option<Decimal>,
    /// Selection price in the latest snapshot inside the closing window
    pub closing_odds: Option<Decimal>,
    pub closing_observed_at: Option<DateTime<Utc>>,
    /// Implied-probability shift from opening to closing, in points
    pub clv_value: Option<f64>,

    pub actual_score: Option<ActualScore>,
    pub outcome: PredictionOutcome,
    pub settled_at: Option<DateTime<Utc>>,
    pub void_reason: Option<String>,
}

/// Ledger errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// No entry with this id
    #[error("Ledger entry not found: {0}")]
    NotFound(LedgerId),
    /// Write against an entry in the wrong lifecycle state
    #[error("State conflict on {id} ({state}): {reason}")]
    StateConflict {
        id: LedgerId,
        state: PredictionOutcome,
        reason: &'static str,
    },
    /// Write after kickoff
    #[error("Match for {id} already started at {kickoff}")]
    MatchStarted {
        id: LedgerId,
        kickoff: DateTime<Utc>,
    },
    /// Snapshot carries no usable price for the selection
    #[error("Odds snapshot has no valid price for {0}")]
    InvalidSnapshot(Outcome),
    /// Two entries share a key
    #[error("Duplicate ledger key: {0}")]
    DuplicateKey(LedgerKey),
}
