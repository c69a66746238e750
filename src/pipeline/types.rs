//! Analysis output types

use crate::edge::EdgeBucket;
use crate::market::{MarketProbability, OddsError, OddsTriple};
use crate::model::{Adjustment, BlendError, Confidence, ModelProbability};
use crate::signal::{Outcome, SignalError, Sport, UniversalSignals};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema version of [`AnalysisSnapshot`]
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Market intelligence for one match, consumed by presentation layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketIntel {
    pub match_id: String,
    pub sport: Sport,
    pub model_probability: ModelProbability,
    pub market_probability_raw: Option<MarketProbability>,
    pub market_probability_fair: Option<MarketProbability>,
    /// `None` when no fair market exists for the selection
    pub edge_value: Option<f64>,
    pub edge_bucket: EdgeBucket,
    pub selection: Outcome,
    pub confidence: Confidence,
}

/// Versioned record of everything an analysis used and produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub schema_version: u32,
    pub model_version: String,
    pub signals: UniversalSignals,
    pub odds: Option<OddsTriple>,
    pub adjustments: Vec<Adjustment>,
    pub intel: MarketIntel,
}

/// A completed analysis
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub intel: MarketIntel,
    pub snapshot: AnalysisSnapshot,
}

/// Why a match could not be analyzed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Signal(#[from] SignalError),
    #[error(transparent)]
    Odds(#[from] OddsError),
    #[error(transparent)]
    Blend(#[from] BlendError),
}

impl AnalysisError {
    /// Stable reason code for batch reports
    pub fn reason_code(&self) -> &'static str {
        match self {
            AnalysisError::Signal(SignalError::InputIncomplete { .. }) => "input_incomplete",
            AnalysisError::Signal(SignalError::SameTeam(_)) => "input_invalid",
            AnalysisError::Odds(_) => "odds_invalid",
            AnalysisError::Blend(BlendError::NoBaseline) => "no_baseline",
        }
    }

    /// What end users are shown
    pub fn user_message(&self) -> &'static str {
        "insufficient data for this match"
    }
}

/// Outcome of one match within a batch
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub match_id: String,
    pub result: Result<Analysis, AnalysisError>,
}
