//! Features-only estimate used when no complete market is available
//!
//! Rates each side by season net scoring per game, scales the differential
//! per sport and maps it through a logistic curve. Three-way sports carve a
//! draw share out first, shrinking as the mismatch grows.

use super::{BlendError, BlendWeights};
use crate::signal::{OutcomeSpace, UniversalSignals};

/// Draw share of an evenly matched three-way fixture
const BASE_DRAW: f64 = 28.0;
/// Draw points lost per logistic unit of mismatch
const DRAW_DECAY: f64 = 8.0;
const MIN_DRAW: f64 = 12.0;

/// Unnormalized `(home, draw, away)` in points
pub(super) fn features_only(
    signals: &UniversalSignals,
    weights: &BlendWeights,
) -> Result<(f64, Option<f64>, f64), BlendError> {
    let stats = signals
        .season_stats
        .as_ref()
        .ok_or(BlendError::NoBaseline)?;

    let z = (stats.home.net_rate() - stats.away.net_rate()) * signals.sport.rating_scale()
        + weights.home_advantage;
    if !z.is_finite() {
        return Err(BlendError::NoBaseline);
    }
    let p_home = logistic(z);

    Ok(match signals.outcome_space {
        OutcomeSpace::TwoWay => (100.0 * p_home, None, 100.0 * (1.0 - p_home)),
        OutcomeSpace::ThreeWay => {
            let draw = (BASE_DRAW - DRAW_DECAY * z.abs()).clamp(MIN_DRAW, BASE_DRAW);
            let decisive = 100.0 - draw;
            (decisive * p_home, Some(draw), decisive * (1.0 - p_home))
        }
    })
}

fn logistic(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{normalize, PerSide, RawMatchInput, SeasonStats};
    use chrono::Utc;

    fn create_test_signals(sport: &str, home_net: f64, away_net: f64) -> UniversalSignals {
        let mut signals = normalize(&RawMatchInput {
            match_id: "m-fb".to_string(),
            sport: sport.to_string(),
            home_team: "Home".to_string(),
            away_team: "Away".to_string(),
            kickoff: Some(Utc::now()),
            ..Default::default()
        })
        .unwrap();
        signals.season_stats = Some(PerSide {
            home: SeasonStats {
                scored: 10.0 + home_net * 10.0,
                conceded: 10.0,
                played: 10,
            },
            away: SeasonStats {
                scored: 10.0 + away_net * 10.0,
                conceded: 10.0,
                played: 10,
            },
        });
        signals
    }

    #[test]
    fn test_requires_season_stats() {
        let mut signals = create_test_signals("soccer", 0.0, 0.0);
        signals.season_stats = None;
        assert_eq!(
            features_only(&signals, &BlendWeights::default()),
            Err(BlendError::NoBaseline)
        );
    }

    #[test]
    fn test_even_teams_home_advantage() {
        let signals = create_test_signals("basketball_nba", 0.0, 0.0);
        let (home, draw, away) = features_only(&signals, &BlendWeights::default()).unwrap();
        assert!(draw.is_none());
        assert!(home > away);
        assert!((home + away - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_three_way_draw_shrinks_with_mismatch() {
        let weights = BlendWeights {
            home_advantage: 0.0,
            ..Default::default()
        };
        let even = features_only(&create_test_signals("soccer", 0.0, 0.0), &weights).unwrap();
        let lopsided = features_only(&create_test_signals("soccer", 1.5, -0.5), &weights).unwrap();

        assert_eq!(even.1, Some(BASE_DRAW));
        assert!(lopsided.1.unwrap() < BASE_DRAW);
        assert!(lopsided.0 > lopsided.2);
        let total = lopsided.0 + lopsided.1.unwrap() + lopsided.2;
        assert!((total - 100.0).abs() < 1e-9);
    }
}
