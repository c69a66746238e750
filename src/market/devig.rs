//! Margin removal
//!
//! raw(o)  = 100 / odds(o)
//! fair(o) = raw(o) * 100 / sum(raw)
//!
//! Odds at or below 1.0 carry no information and are excluded; the remaining
//! outcomes are renormalized over themselves.

use super::{MarketPricing, MarketProbability, OddsError, OddsTriple};
use crate::signal::Outcome;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Implied probability in percent, `None` for odds <= 1.0
pub fn implied_probability(odds: Decimal) -> Option<f64> {
    if odds <= Decimal::ONE {
        return None;
    }
    let odds = odds.to_f64()?;
    Some(100.0 / odds)
}

/// De-vig decimal odds into raw and fair probabilities
pub fn devig(odds: &OddsTriple) -> Result<MarketPricing, OddsError> {
    let mut raw = MarketProbability::default();
    let mut excluded = vec![];

    for outcome in [Outcome::Home, Outcome::Draw, Outcome::Away] {
        let Some(price) = odds.price(outcome) else {
            continue;
        };
        match implied_probability(price) {
            Some(p) => raw.set(outcome, p),
            None => excluded.push(outcome),
        }
    }

    let valid = raw.iter().count();
    if valid < 2 {
        return Err(OddsError::TooFewValidOutcomes { valid });
    }

    let book = raw.total();
    let mut fair = MarketProbability::default();
    for (outcome, p) in raw.iter() {
        fair.set(outcome, p * 100.0 / book);
    }

    if !excluded.is_empty() {
        tracing::debug!(?excluded, "Excluded outcomes with invalid odds from de-vig");
    }

    Ok(MarketPricing {
        raw,
        fair,
        overround: book - 100.0,
        excluded,
    })
}
