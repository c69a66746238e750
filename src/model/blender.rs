//! Market-anchored probability blender
//!
//! Starts from the de-vigged market as the prior, applies capped
//! situational shifts between home and away, then renormalizes to 100.
//! Without a complete market it falls back to the features-only estimate
//! and reports low confidence.

use super::adjustments;
use super::fallback;
use super::{
    round2, BlendError, BlendOutput, BlendWeights, Confidence, ModelProbability, ProbabilityModel,
};
use crate::market::MarketPricing;
use crate::signal::{OutcomeSpace, UniversalSignals};

/// Completeness at or above which an anchored blend is standard confidence
const STANDARD_COMPLETENESS: f64 = 0.5;

/// Blends signals with the market prior
#[derive(Debug, Clone, Default)]
pub struct Blender {
    weights: BlendWeights,
}

impl Blender {
    /// Create a new blender
    pub fn new(weights: BlendWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &BlendWeights {
        &self.weights
    }

    /// Blend signals and market into model probabilities
    pub fn blend(
        &self,
        signals: &UniversalSignals,
        market: Option<&MarketPricing>,
    ) -> Result<BlendOutput, BlendError> {
        let space = signals.outcome_space;
        let anchor = market
            .filter(|m| m.is_complete(space))
            .and_then(|m| match (m.fair.home, m.fair.away) {
                (Some(home), Some(away)) => Some((home, m.fair.draw, away)),
                _ => None,
            });

        let anchored = anchor.is_some();
        let (mut home, draw, mut away) = match anchor {
            Some((home, draw, away)) => {
                let draw = if space.allows_draw() { draw } else { None };
                (home, draw, away)
            }
            None => fallback::features_only(signals, &self.weights)?,
        };

        let adjustments = adjustments::compute(signals, &self.weights);
        let shift: f64 = adjustments.iter().map(|a| a.applied).sum();
        home += shift;
        away -= shift;

        let mut values = match draw {
            Some(draw) => vec![home, draw, away],
            None => vec![home, away],
        };
        renormalize(&mut values, self.weights.probability_floor);

        let confidence = if !anchored {
            Confidence::Low
        } else if signals.availability.completeness() >= STANDARD_COMPLETENESS {
            Confidence::Standard
        } else {
            Confidence::Reduced
        };

        let probability = match (space, values.as_slice()) {
            (OutcomeSpace::ThreeWay, [home, draw, away]) => ModelProbability {
                home: *home,
                draw: Some(*draw),
                away: *away,
                confidence,
            },
            (_, [home, away]) => ModelProbability {
                home: *home,
                draw: None,
                away: *away,
                confidence,
            },
            // Three-way space with a two-way anchor cannot happen: completeness was checked
            _ => return Err(BlendError::NoBaseline),
        };

        tracing::debug!(
            match_id = %signals.match_id,
            anchored,
            shift,
            home = probability.home,
            draw = ?probability.draw,
            away = probability.away,
            ?confidence,
            "Blended probabilities"
        );

        Ok(BlendOutput {
            probability,
            anchored,
            adjustments,
        })
    }
}

impl ProbabilityModel for Blender {
    fn estimate(
        &self,
        signals: &UniversalSignals,
        market: Option<&MarketPricing>,
    ) -> Result<BlendOutput, BlendError> {
        self.blend(signals, market)
    }
}

/// Floor, scale to 100, round to 2dp and put the rounding residual on the
/// largest outcome so the total is exactly 100.
fn renormalize(values: &mut [f64], floor: f64) {
    for v in values.iter_mut() {
        *v = v.max(floor);
    }
    let total: f64 = values.iter().sum();
    for v in values.iter_mut() {
        *v = round2(*v * 100.0 / total);
    }
    let residual = 100.0 - values.iter().sum::<f64>();
    if let Some(largest) = values
        .iter_mut()
        .max_by(|a, b| a.total_cmp(b))
    {
        *largest = round2(*largest + residual);
    }
}
