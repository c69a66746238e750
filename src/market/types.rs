//! Market pricing types

use crate::signal::{Outcome, OutcomeSpace};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bookmaker decimal odds for one fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsTriple {
    pub home: Decimal,
    #[serde(default)]
    pub draw: Option<Decimal>,
    pub away: Decimal,
}

impl OddsTriple {
    pub fn two_way(home: Decimal, away: Decimal) -> Self {
        Self {
            home,
            draw: None,
            away,
        }
    }

    pub fn three_way(home: Decimal, draw: Decimal, away: Decimal) -> Self {
        Self {
            home,
            draw: Some(draw),
            away,
        }
    }

    /// Decimal odds quoted for an outcome
    pub fn price(&self, outcome: Outcome) -> Option<Decimal> {
        match outcome {
            Outcome::Home => Some(self.home),
            Outcome::Draw => self.draw,
            Outcome::Away => Some(self.away),
        }
    }
}

/// Per-outcome probabilities in percentage units (0-100).
///
/// An outcome is `None` when the market gave no usable price for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketProbability {
    pub home: Option<f64>,
    pub draw: Option<f64>,
    pub away: Option<f64>,
}

impl MarketProbability {
    pub fn get(&self, outcome: Outcome) -> Option<f64> {
        match outcome {
            Outcome::Home => self.home,
            Outcome::Draw => self.draw,
            Outcome::Away => self.away,
        }
    }

    pub(crate) fn set(&mut self, outcome: Outcome, value: f64) {
        match outcome {
            Outcome::Home => self.home = Some(value),
            Outcome::Draw => self.draw = Some(value),
            Outcome::Away => self.away = Some(value),
        }
    }

    /// Priced outcomes with their probability
    pub fn iter(&self) -> impl Iterator<Item = (Outcome, f64)> + '_ {
        [Outcome::Home, Outcome::Draw, Outcome::Away]
            .into_iter()
            .filter_map(|o| self.get(o).map(|p| (o, p)))
    }

    pub fn total(&self) -> f64 {
        self.iter().map(|(_, p)| p).sum()
    }

    /// Whether every outcome of `space` is priced
    pub fn covers(&self, space: OutcomeSpace) -> bool {
        space.outcomes().iter().all(|o| self.get(*o).is_some())
    }

    /// Market favorite (highest probability)
    pub fn favorite(&self) -> Option<Outcome> {
        self.iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(outcome, _)| outcome)
    }
}

/// Result of de-vigging a set of odds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPricing {
    /// Naive `100 / odds` per outcome; sums above 100
    pub raw: MarketProbability,
    /// Margin-free probabilities; sum to 100
    pub fair: MarketProbability,
    /// Bookmaker margin in percentage points (`sum(raw) - 100`)
    pub overround: f64,
    /// Outcomes dropped because their odds were invalid
    pub excluded: Vec<Outcome>,
}

impl MarketPricing {
    /// Whether the fair probabilities can anchor a blend over `space`
    pub fn is_complete(&self, space: OutcomeSpace) -> bool {
        self.fair.covers(space)
    }
}

/// De-vig errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OddsError {
    /// Fewer than two outcomes carry odds above 1.0
    #[error("Odds invalid: {valid} valid outcome(s), need at least 2")]
    TooFewValidOutcomes { valid: usize },
}
