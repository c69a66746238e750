//! Bounded situational adjustments
//!
//! Every factor yields a shift in points towards the home side (negative
//! means towards the away side), capped at `max_adjustment`. A factor whose
//! input dimension is unavailable contributes nothing.

use super::BlendWeights;
use crate::signal::{H2hResult, TeamSide, UniversalSignals};
use serde::{Deserialize, Serialize};

/// Rest differentials beyond this many days are treated as equal
const MAX_REST_DAYS: i64 = 3;

/// Situational factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Form,
    Injuries,
    RestTravel,
    HeadToHead,
}

/// One applied adjustment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub factor: Factor,
    /// Uncapped shift in points
    pub raw: f64,
    /// Shift actually applied
    pub applied: f64,
}

impl Adjustment {
    fn capped(factor: Factor, raw: f64, cap: f64) -> Self {
        Self {
            factor,
            raw,
            applied: raw.clamp(-cap, cap),
        }
    }
}

/// Compute all available adjustments
pub fn compute(signals: &UniversalSignals, weights: &BlendWeights) -> Vec<Adjustment> {
    let cap = weights.max_adjustment.abs();
    [
        form_shift(signals, weights),
        injury_shift(signals, weights),
        rest_shift(signals, weights),
        h2h_shift(signals, weights),
    ]
    .into_iter()
    .flatten()
    .filter(|(_, raw)| raw.is_finite())
    .map(|(factor, raw)| Adjustment::capped(factor, raw, cap))
    .collect()
}

fn form_shift(signals: &UniversalSignals, weights: &BlendWeights) -> Option<(Factor, f64)> {
    let form = signals.form.as_ref()?;
    let diff = form.home.score() - form.away.score();
    Some((Factor::Form, diff * weights.form_weight))
}

fn injury_shift(signals: &UniversalSignals, weights: &BlendWeights) -> Option<(Factor, f64)> {
    let home = signals.injury_load(TeamSide::Home)?;
    let away = signals.injury_load(TeamSide::Away)?;
    // Away absences help the home side
    Some((Factor::Injuries, (away - home) * weights.injury_weight))
}

fn rest_shift(signals: &UniversalSignals, weights: &BlendWeights) -> Option<(Factor, f64)> {
    let rest = signals.rest.as_ref()?;
    let days = (rest.home_rest_days as i64 - rest.away_rest_days as i64)
        .clamp(-MAX_REST_DAYS, MAX_REST_DAYS);
    let travel = rest.away_travel_km.unwrap_or(0.0) / 1000.0;
    Some((
        Factor::RestTravel,
        days as f64 * weights.rest_weight + travel * weights.travel_weight,
    ))
}

fn h2h_shift(signals: &UniversalSignals, weights: &BlendWeights) -> Option<(Factor, f64)> {
    let meetings = signals.h2h.as_ref()?;
    if meetings.len() < weights.min_h2h_meetings.max(1) {
        return None;
    }
    let balance: i64 = meetings
        .iter()
        .map(|m| match m {
            H2hResult::HomeWin => 1,
            H2hResult::Draw => 0,
            H2hResult::AwayWin => -1,
        })
        .sum();
    let bias = balance as f64 / meetings.len() as f64;
    Some((Factor::HeadToHead, bias * weights.h2h_weight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{
        normalize, FormResult, PerSide, RawMatchInput, RestContext, TeamForm,
    };
    use chrono::Utc;

    fn create_test_signals() -> UniversalSignals {
        normalize(&RawMatchInput {
            match_id: "m-adj".to_string(),
            sport: "soccer".to_string(),
            home_team: "Home".to_string(),
            away_team: "Away".to_string(),
            kickoff: Some(Utc::now()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_no_inputs_no_adjustments() {
        let signals = create_test_signals();
        assert!(compute(&signals, &BlendWeights::default()).is_empty());
    }

    #[test]
    fn test_form_shift_capped() {
        let mut signals = create_test_signals();
        signals.form = Some(PerSide {
            home: TeamForm {
                results: vec![FormResult::Win; 5],
            },
            away: TeamForm {
                results: vec![FormResult::Loss; 5],
            },
        });
        let adjustments = compute(&signals, &BlendWeights::default());
        assert_eq!(adjustments.len(), 1);
        assert_eq!(adjustments[0].factor, Factor::Form);
        assert_eq!(adjustments[0].raw, 6.0);
        assert_eq!(adjustments[0].applied, 4.0);
    }

    #[test]
    fn test_rest_and_travel() {
        let mut signals = create_test_signals();
        signals.rest = Some(RestContext {
            home_rest_days: 7,
            away_rest_days: 2,
            away_travel_km: Some(2000.0),
        });
        let adjustments = compute(&signals, &BlendWeights::default());
        // 3 days (clamped) * 0.5 + 2 * 0.5
        assert!((adjustments[0].applied - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_h2h_needs_minimum_meetings() {
        let mut signals = create_test_signals();
        signals.h2h = Some(vec![H2hResult::AwayWin]);
        assert!(compute(&signals, &BlendWeights::default()).is_empty());

        signals.h2h = Some(vec![H2hResult::AwayWin, H2hResult::AwayWin, H2hResult::Draw, H2hResult::HomeWin]);
        let adjustments = compute(&signals, &BlendWeights::default());
        // balance -1 over 4 meetings
        assert!((adjustments[0].applied + 0.75).abs() < 1e-9);
    }
}
