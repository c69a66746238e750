//! Edge classification

use super::{EdgeAssessment, EdgeBucket, EdgeThresholds};
use crate::market::MarketProbability;
use crate::model::{round2, ModelProbability};
use crate::signal::Outcome;

/// Picks the selection with the largest edge and buckets it
#[derive(Debug, Clone)]
pub struct EdgeClassifier {
    thresholds: EdgeThresholds,
    tie_tolerance: f64,
}

impl EdgeClassifier {
    /// Create a new classifier
    pub fn new(thresholds: EdgeThresholds, tie_tolerance: f64) -> Self {
        Self {
            thresholds,
            tie_tolerance,
        }
    }

    pub fn thresholds(&self) -> &EdgeThresholds {
        &self.thresholds
    }

    pub fn tie_tolerance(&self) -> f64 {
        self.tie_tolerance
    }

    /// Bucket an edge by its magnitude
    pub fn bucket(&self, edge_value: f64) -> EdgeBucket {
        let magnitude = edge_value.abs();
        if magnitude >= self.thresholds.high {
            EdgeBucket::High
        } else if magnitude >= self.thresholds.medium {
            EdgeBucket::Medium
        } else if magnitude >= self.thresholds.small {
            EdgeBucket::Small
        } else {
            EdgeBucket::NoEdge
        }
    }

    /// Edge and bucket for a given selection, `None` if either side lacks it
    pub fn classify(
        &self,
        model: &ModelProbability,
        fair: &MarketProbability,
        selection: Outcome,
    ) -> Option<EdgeAssessment> {
        let edge_value = round2(model.get(selection)? - fair.get(selection)?);
        Some(EdgeAssessment {
            selection,
            edge_value,
            bucket: self.bucket(edge_value),
        })
    }

    /// Outcome where the model most favorably disagrees with the market.
    ///
    /// Edges within the tie tolerance of the best go to the market favorite.
    pub fn select(&self, model: &ModelProbability, fair: &MarketProbability) -> Option<Outcome> {
        let edges: Vec<(Outcome, f64)> = model
            .iter()
            .filter_map(|(outcome, p)| fair.get(outcome).map(|f| (outcome, p - f)))
            .collect();

        let best = edges
            .iter()
            .map(|(_, e)| *e)
            .fold(f64::NEG_INFINITY, f64::max);
        let tied: Vec<Outcome> = edges
            .iter()
            .filter(|(_, e)| best - e <= self.tie_tolerance)
            .map(|(o, _)| *o)
            .collect();

        match tied.as_slice() {
            [] => None,
            [only] => Some(*only),
            candidates => crate::model::pick_market_favorite(fair, candidates),
        }
    }

    /// Select and classify in one step
    pub fn assess(
        &self,
        model: &ModelProbability,
        fair: &MarketProbability,
    ) -> Option<EdgeAssessment> {
        let selection = self.select(model, fair)?;
        self.classify(model, fair, selection)
    }
}

impl Default for EdgeClassifier {
    fn default() -> Self {
        Self::new(EdgeThresholds::default(), 0.1)
    }
}
