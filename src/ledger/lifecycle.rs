//! Ledger entry lifecycle
//!
//! PENDING -> {HIT, MISS, PUSH}. Terminal states accept no further writes
//! except integrity repair. Every method validates before mutating, so a
//! rejected write leaves the entry untouched.

use super::types::{
    FieldChange, LedgerError, LedgerKey, OddsAttachment, OddsSnapshot, PredictionLedgerEntry,
    PredictionOutcome, RepairPatch, Resolution,
};
use crate::pipeline::Analysis;
use crate::tracker::closing_line_value;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

impl PredictionLedgerEntry {
    /// Create a PENDING entry from an analysis
    pub fn from_analysis(analysis: &Analysis, predicted_at: DateTime<Utc>) -> Self {
        let intel = &analysis.intel;
        let snapshot = &analysis.snapshot;
        Self {
            id: Uuid::new_v4(),
            match_id: intel.match_id.clone(),
            model_version: snapshot.model_version.clone(),
            sport: intel.sport,
            selection: intel.selection,
            snapshot: snapshot.clone(),
            model_probability: intel.model_probability,
            market_probability_raw: intel.market_probability_raw,
            market_probability_fair: intel.market_probability_fair,
            market_odds_at_prediction: snapshot.odds.clone(),
            edge_value: intel.edge_value,
            edge_bucket: intel.edge_bucket,
            prediction_timestamp: predicted_at,
            kickoff: snapshot.signals.kickoff,
            opening_odds: None,
            closing_odds: None,
            closing_observed_at: None,
            clv_value: None,
            actual_score: None,
            outcome: PredictionOutcome::Pending,
            settled_at: None,
            void_reason: None,
        }
    }

    pub fn key(&self) -> LedgerKey {
        LedgerKey::new(self.match_id.clone(), self.model_version.clone())
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_terminal()
    }

    fn conflict(&self, reason: &'static str) -> LedgerError {
        LedgerError::StateConflict {
            id: self.id,
            state: self.outcome,
            reason,
        }
    }

    /// Replace this PENDING prediction with a re-analysis of the same key.
    ///
    /// Identity is kept. Captured odds survive unless the selection changed,
    /// since they are prices of the selection.
    pub fn replace_prediction(&mut self, newer: PredictionLedgerEntry) -> Result<(), LedgerError> {
        if self.is_terminal() {
            return Err(self.conflict("cannot re-record a settled prediction"));
        }
        if newer.prediction_timestamp >= newer.kickoff {
            return Err(LedgerError::MatchStarted {
                id: self.id,
                kickoff: newer.kickoff,
            });
        }

        let keep_odds = newer.selection == self.selection;
        let replaced = PredictionLedgerEntry {
            id: self.id,
            opening_odds: if keep_odds { self.opening_odds } else { None },
            closing_odds: if keep_odds { self.closing_odds } else { None },
            closing_observed_at: if keep_odds { self.closing_observed_at } else { None },
            clv_value: if keep_odds { self.clv_value } else { None },
            ..newer
        };
        *self = replaced;
        Ok(())
    }

    /// Attach an odds snapshot observed before kickoff.
    ///
    /// Opening odds are written once. Closing odds follow the latest
    /// snapshot inside `closing_window` before kickoff and recompute CLV.
    pub fn apply_odds_snapshot(
        &mut self,
        snapshot: &OddsSnapshot,
        closing_window: Duration,
    ) -> Result<OddsAttachment, LedgerError> {
        if self.is_terminal() {
            return Err(self.conflict("odds are frozen after settlement"));
        }
        if snapshot.observed_at >= self.kickoff {
            return Err(LedgerError::MatchStarted {
                id: self.id,
                kickoff: self.kickoff,
            });
        }
        let price = snapshot
            .odds
            .price(self.selection)
            .filter(|p| *p > Decimal::ONE)
            .ok_or(LedgerError::InvalidSnapshot(self.selection))?;

        let mut attachment = OddsAttachment::default();
        if self.opening_odds.is_none() {
            self.opening_odds = Some(price);
            attachment.opening_set = true;
        }

        let in_window = self.kickoff - snapshot.observed_at <= closing_window;
        let newer = self
            .closing_observed_at
            .map_or(true, |seen| snapshot.observed_at >= seen);
        if in_window && newer {
            self.closing_odds = Some(price);
            self.closing_observed_at = Some(snapshot.observed_at);
            self.clv_value = self
                .opening_odds
                .and_then(|opening| closing_line_value(opening, price));
            attachment.closing_set = true;
        }
        attachment.clv_value = self.clv_value;
        Ok(attachment)
    }

    /// Move PENDING to a terminal state
    pub fn apply_resolution(
        &mut self,
        resolution: &Resolution,
        settled_at: DateTime<Utc>,
    ) -> Result<PredictionOutcome, LedgerError> {
        if self.is_terminal() {
            return Err(self.conflict("entry already settled"));
        }
        let outcome = resolution.outcome();
        if !outcome.is_terminal() {
            return Err(self.conflict("resolution must be terminal"));
        }

        match resolution {
            Resolution::Settled { score, .. } => self.actual_score = Some(*score),
            Resolution::Voided { reason } => self.void_reason = Some(reason.clone()),
        }
        self.outcome = outcome;
        self.settled_at = Some(settled_at);
        Ok(outcome)
    }

    /// Overwrite corrupted fields. Works in any state and reports every
    /// change it made.
    pub fn apply_repair(&mut self, patch: &RepairPatch) -> Result<Vec<FieldChange>, LedgerError> {
        if patch
            .planned_against
            .is_some_and(|at| at != self.prediction_timestamp)
        {
            return Err(self.conflict("entry was re-recorded after the repair was planned"));
        }

        let mut changes = vec![];

        if let Some(probability) = patch.model_probability {
            if probability != self.model_probability {
                changes.push(FieldChange {
                    field: "model_probability",
                    before: format!("{:?}", self.model_probability),
                    after: format!("{:?}", probability),
                });
                self.model_probability = probability;
            }
        }

        if let Some((raw, fair)) = patch.market {
            if raw != self.market_probability_raw {
                changes.push(FieldChange {
                    field: "market_probability_raw",
                    before: format!("{:?}", self.market_probability_raw),
                    after: format!("{:?}", raw),
                });
                self.market_probability_raw = raw;
            }
            if fair != self.market_probability_fair {
                changes.push(FieldChange {
                    field: "market_probability_fair",
                    before: format!("{:?}", self.market_probability_fair),
                    after: format!("{:?}", fair),
                });
                self.market_probability_fair = fair;
            }
        }

        if let Some((edge_value, edge_bucket)) = patch.edge {
            if edge_value != self.edge_value {
                changes.push(FieldChange {
                    field: "edge_value",
                    before: format!("{:?}", self.edge_value),
                    after: format!("{:?}", edge_value),
                });
                self.edge_value = edge_value;
            }
            if edge_bucket != self.edge_bucket {
                changes.push(FieldChange {
                    field: "edge_bucket",
                    before: self.edge_bucket.to_string(),
                    after: edge_bucket.to_string(),
                });
                self.edge_bucket = edge_bucket;
            }
        }

        Ok(changes)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::create_test_entry;
    use super::*;
    use crate::ledger::ActualScore;
    use crate::market::{MarketProbability, OddsTriple};
    use crate::model::ModelProbability;
    use crate::signal::Outcome;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn kickoff() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 11, 1, 15, 0, 0).unwrap()
    }

    fn snapshot(home: Decimal, minutes_before: i64) -> OddsSnapshot {
        OddsSnapshot {
            odds: OddsTriple::three_way(home, dec!(3.40), dec!(4.50)),
            observed_at: kickoff() - Duration::minutes(minutes_before),
        }
    }

    #[test]
    fn test_new_entry_is_pending() {
        let entry = create_test_entry("m-1", kickoff());
        assert_eq!(entry.outcome, PredictionOutcome::Pending);
        assert_eq!(entry.selection, Outcome::Home);
        assert!(entry.clv_value.is_none());
        assert_eq!(entry.key(), LedgerKey::new("m-1", "v1"));
    }

    #[test]
    fn test_opening_written_once() {
        let mut entry = create_test_entry("m-1", kickoff());
        let first = entry.apply_odds_snapshot(&snapshot(dec!(1.80), 600), Duration::minutes(30)).unwrap();
        assert!(first.opening_set);
        assert!(!first.closing_set);

        let second = entry.apply_odds_snapshot(&snapshot(dec!(1.75), 300), Duration::minutes(30)).unwrap();
        assert!(!second.opening_set);
        assert_eq!(entry.opening_odds, Some(dec!(1.80)));
        assert!(entry.closing_odds.is_none());
        assert!(entry.clv_value.is_none());
    }

    #[test]
    fn test_closing_sets_clv() {
        let mut entry = create_test_entry("m-1", kickoff());
        entry.apply_odds_snapshot(&snapshot(dec!(1.80), 600), Duration::minutes(30)).unwrap();
        let attachment = entry.apply_odds_snapshot(&snapshot(dec!(1.65), 10), Duration::minutes(30)).unwrap();

        assert!(attachment.closing_set);
        assert_eq!(entry.closing_odds, Some(dec!(1.65)));
        let clv = entry.clv_value.unwrap();
        assert!((clv - 5.05).abs() < 0.01);
    }

    #[test]
    fn test_older_closing_snapshot_ignored() {
        let mut entry = create_test_entry("m-1", kickoff());
        entry.apply_odds_snapshot(&snapshot(dec!(1.70), 5), Duration::minutes(30)).unwrap();
        let late = entry.apply_odds_snapshot(&snapshot(dec!(1.90), 20), Duration::minutes(30)).unwrap();
        assert!(!late.closing_set);
        assert_eq!(entry.closing_odds, Some(dec!(1.70)));
    }

    #[test]
    fn test_snapshot_after_kickoff_rejected() {
        let mut entry = create_test_entry("m-1", kickoff());
        let err = entry
            .apply_odds_snapshot(&snapshot(dec!(1.80), 0), Duration::minutes(30))
            .unwrap_err();
        assert!(matches!(err, LedgerError::MatchStarted { .. }));
        assert!(entry.opening_odds.is_none());
    }

    #[test]
    fn test_snapshot_without_selection_price_rejected() {
        let mut entry = create_test_entry("m-1", kickoff());
        let err = entry
            .apply_odds_snapshot(&snapshot(dec!(1.0), 60), Duration::minutes(30))
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidSnapshot(Outcome::Home));
    }

    #[test]
    fn test_settle_is_terminal() {
        let mut entry = create_test_entry("m-1", kickoff());
        let resolution = Resolution::Settled {
            outcome: PredictionOutcome::Hit,
            score: ActualScore { home: 2, away: 0 },
        };
        let outcome = entry.apply_resolution(&resolution, kickoff() + Duration::hours(2)).unwrap();
        assert_eq!(outcome, PredictionOutcome::Hit);

        let before = entry.clone();
        let err = entry.apply_resolution(&resolution, kickoff() + Duration::hours(3)).unwrap_err();
        assert!(matches!(err, LedgerError::StateConflict { .. }));
        assert_eq!(entry, before);

        let err = entry
            .apply_odds_snapshot(&snapshot(dec!(1.80), 10), Duration::minutes(30))
            .unwrap_err();
        assert!(matches!(err, LedgerError::StateConflict { .. }));
    }

    #[test]
    fn test_void_is_push() {
        let mut entry = create_test_entry("m-1", kickoff());
        let outcome = entry
            .apply_resolution(
                &Resolution::Voided {
                    reason: "postponed".to_string(),
                },
                kickoff(),
            )
            .unwrap();
        assert_eq!(outcome, PredictionOutcome::Push);
        assert_eq!(entry.void_reason.as_deref(), Some("postponed"));
        assert!(entry.actual_score.is_none());
    }

    #[test]
    fn test_replace_keeps_identity_and_odds() {
        let mut entry = create_test_entry("m-1", kickoff());
        entry.apply_odds_snapshot(&snapshot(dec!(1.80), 600), Duration::minutes(30)).unwrap();
        let id = entry.id;

        let mut newer = create_test_entry("m-1", kickoff());
        newer.edge_value = Some(9.0);
        entry.replace_prediction(newer).unwrap();

        assert_eq!(entry.id, id);
        assert_eq!(entry.edge_value, Some(9.0));
        assert_eq!(entry.opening_odds, Some(dec!(1.80)));
    }

    #[test]
    fn test_replace_with_new_selection_drops_odds() {
        let mut entry = create_test_entry("m-1", kickoff());
        entry.apply_odds_snapshot(&snapshot(dec!(1.80), 600), Duration::minutes(30)).unwrap();

        let mut newer = create_test_entry("m-1", kickoff());
        newer.selection = Outcome::Away;
        entry.replace_prediction(newer).unwrap();
        assert!(entry.opening_odds.is_none());
        assert!(entry.clv_value.is_none());
    }

    #[test]
    fn test_replace_after_kickoff_rejected() {
        let mut entry = create_test_entry("m-1", kickoff());
        let mut newer = create_test_entry("m-1", kickoff());
        newer.prediction_timestamp = kickoff() + Duration::minutes(1);
        assert!(matches!(
            entry.replace_prediction(newer),
            Err(LedgerError::MatchStarted { .. })
        ));
    }

    #[test]
    fn test_repair_reports_changes() {
        let mut entry = create_test_entry("m-1", kickoff());
        entry.apply_resolution(
            &Resolution::Settled {
                outcome: PredictionOutcome::Miss,
                score: ActualScore { home: 0, away: 1 },
            },
            kickoff(),
        )
        .unwrap();
        let original = entry.model_probability;
        entry.model_probability.home /= 100.0;

        let patch = RepairPatch {
            model_probability: Some(original),
            ..Default::default()
        };
        let changes = entry.apply_repair(&patch).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "model_probability");
        assert_eq!(entry.model_probability, original);
        // Nothing left to change
        assert!(entry.apply_repair(&patch).unwrap().is_empty());
    }

    #[test]
    fn test_repair_restores_market_probabilities() {
        let mut entry = create_test_entry("m-1", kickoff());
        let fair = entry.market_probability_fair;
        let raw = entry.market_probability_raw;
        entry.market_probability_fair = fair.map(|f| MarketProbability {
            home: f.home.map(|p| p / 100.0),
            draw: f.draw.map(|p| p / 100.0),
            away: f.away.map(|p| p / 100.0),
        });

        let changes = entry
            .apply_repair(&RepairPatch {
                market: Some((raw, fair)),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "market_probability_fair");
        assert_eq!(entry.market_probability_fair, fair);
    }

    #[test]
    fn test_repair_refused_after_re_record() {
        let mut entry = create_test_entry("m-1", kickoff());
        let planned_against = entry.prediction_timestamp;

        let mut newer = create_test_entry("m-1", kickoff());
        newer.prediction_timestamp = planned_against + Duration::minutes(5);
        entry.replace_prediction(newer).unwrap();

        let before = entry.clone();
        let result = entry.apply_repair(&RepairPatch {
            model_probability: Some(ModelProbability {
                home: 1.0,
                ..before.model_probability
            }),
            planned_against: Some(planned_against),
            ..Default::default()
        });
        assert!(matches!(result, Err(LedgerError::StateConflict { .. })));
        assert_eq!(entry, before);
    }
}
