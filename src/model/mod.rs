//! Probability model module
//!
//! Blends normalized signals with the market prior into calibrated outcome
//! probabilities. All probability arithmetic is in percentage units.

mod adjustments;
mod blender;
mod fallback;

pub use adjustments::{Adjustment, Factor};
pub use blender::Blender;

use crate::market::{MarketPricing, MarketProbability};
use crate::signal::{Outcome, OutcomeSpace, UniversalSignals};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Allowed deviation of a model probability total from 100
pub const SUM_TOLERANCE: f64 = 0.5;

/// How much the estimate can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Features-only estimate without a market anchor
    Low,
    /// Market-anchored but with most situational inputs missing
    Reduced,
    /// Market-anchored with most inputs present
    Standard,
}

/// Model outcome probabilities in percentage units, summing to 100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelProbability {
    pub home: f64,
    pub draw: Option<f64>,
    pub away: f64,
    pub confidence: Confidence,
}

impl ModelProbability {
    pub fn get(&self, outcome: Outcome) -> Option<f64> {
        match outcome {
            Outcome::Home => Some(self.home),
            Outcome::Draw => self.draw,
            Outcome::Away => Some(self.away),
        }
    }

    pub fn space(&self) -> OutcomeSpace {
        if self.draw.is_some() {
            OutcomeSpace::ThreeWay
        } else {
            OutcomeSpace::TwoWay
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Outcome, f64)> + '_ {
        self.space()
            .outcomes()
            .iter()
            .filter_map(|o| self.get(*o).map(|p| (*o, p)))
    }

    pub fn total(&self) -> f64 {
        self.home + self.draw.unwrap_or(0.0) + self.away
    }

    /// Sums to 100 within tolerance and has no negative or non-finite outcome
    pub fn is_consistent(&self) -> bool {
        self.iter().all(|(_, p)| p.is_finite() && p >= 0.0)
            && (self.total() - 100.0).abs() <= SUM_TOLERANCE
    }

    /// The model's favored outcome.
    ///
    /// Outcomes within `tolerance` of the top probability are tied; ties go
    /// to the market favorite when a market is known.
    pub fn favorite(&self, market: Option<&MarketProbability>, tolerance: f64) -> Outcome {
        let top = self
            .iter()
            .map(|(_, p)| p)
            .fold(f64::NEG_INFINITY, f64::max);
        let tied: Vec<Outcome> = self
            .iter()
            .filter(|(_, p)| top - p <= tolerance)
            .map(|(o, _)| o)
            .collect();

        if tied.len() > 1 {
            if let Some(market_favorite) = market.and_then(|m| pick_market_favorite(m, &tied)) {
                return market_favorite;
            }
        }
        self.iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(o, _)| o)
            .unwrap_or(Outcome::Home)
    }
}

/// Highest market probability among `candidates`
pub(crate) fn pick_market_favorite(
    market: &MarketProbability,
    candidates: &[Outcome],
) -> Option<Outcome> {
    candidates
        .iter()
        .filter_map(|o| market.get(*o).map(|p| (*o, p)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(o, _)| o)
}

/// Round to two decimal places
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Blend weights and caps
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BlendWeights {
    /// Points per unit of form differential (form scores are 0..=1)
    pub form_weight: f64,
    /// Points per unit of injury load differential
    pub injury_weight: f64,
    /// Points per day of rest advantage
    pub rest_weight: f64,
    /// Points per 1000 km the away side travelled
    pub travel_weight: f64,
    /// Points per unit of head-to-head bias (-1..=1)
    pub h2h_weight: f64,
    /// Ceiling on any single factor, in points
    pub max_adjustment: f64,
    /// Meetings needed before head-to-head counts
    pub min_h2h_meetings: usize,
    /// Probabilities within this many points are tied
    pub tie_tolerance: f64,
    /// Smallest probability any outcome may end with
    pub probability_floor: f64,
    /// Home advantage in logistic units for the features-only estimate
    pub home_advantage: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            form_weight: 6.0,
            injury_weight: 1.5,
            rest_weight: 0.5,
            travel_weight: 0.5,
            h2h_weight: 3.0,
            max_adjustment: 4.0,
            min_h2h_meetings: 2,
            tie_tolerance: 0.1,
            probability_floor: 1.0,
            home_advantage: 0.25,
        }
    }
}

/// Blend result with its audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendOutput {
    pub probability: ModelProbability,
    /// Whether the market prior anchored the estimate
    pub anchored: bool,
    pub adjustments: Vec<Adjustment>,
}

/// Blend errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlendError {
    /// Neither a complete market nor season stats are available
    #[error("No baseline: market odds and season stats both unavailable")]
    NoBaseline,
}

/// Trait for outcome probability models
pub trait ProbabilityModel: Send + Sync {
    /// Estimate outcome probabilities for a match
    fn estimate(
        &self,
        signals: &UniversalSignals,
        market: Option<&MarketPricing>,
    ) -> Result<BlendOutput, BlendError>;
}
