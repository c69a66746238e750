//! Integrity repair
//!
//! Flags ledger entries whose stored model output is internally
//! inconsistent and restores the affected fields from an authoritative
//! analysis snapshot. Values are only ever copied from a snapshot, never
//! inferred. Running a pass twice changes nothing the second time.

use super::types::{IssueKind, IssueStatus, RepairIssue, RepairReport, UnrepairableReason};
use crate::config::RepairConfig;
use crate::ledger::{
    LedgerError, LedgerKey, LedgerQuery, LedgerStore, PredictionLedgerEntry, RepairPatch,
};
use crate::market::MarketProbability;
use crate::model::{round2, ModelProbability};
use crate::pipeline::{AnalysisSnapshot, SNAPSHOT_SCHEMA_VERSION};
use crate::signal::Outcome;
use crate::telemetry::{increment_counter, CounterMetric};
use std::collections::HashMap;

/// Allowed distance of a fair market sum from 100
const FAIR_SUM_TOLERANCE: f64 = 0.5;

/// Authoritative snapshots keyed like the ledger
pub type SnapshotIndex = HashMap<LedgerKey, AnalysisSnapshot>;

/// Index the snapshots embedded in ledger entries
pub fn snapshots_from_entries(entries: &[PredictionLedgerEntry]) -> SnapshotIndex {
    entries
        .iter()
        .map(|e| (e.key(), e.snapshot.clone()))
        .collect()
}

/// Index standalone snapshots; later snapshots of a key win
pub fn snapshots_from_list(snapshots: Vec<AnalysisSnapshot>) -> SnapshotIndex {
    snapshots
        .into_iter()
        .map(|s| (LedgerKey::new(s.intel.match_id.clone(), s.model_version.clone()), s))
        .collect()
}

/// Scans and repairs ledger entries
#[derive(Debug, Clone)]
pub struct IntegrityRepair {
    sum_min: f64,
    sum_max: f64,
    edge_tolerance: f64,
}

impl Default for IntegrityRepair {
    fn default() -> Self {
        Self::from_config(&RepairConfig::default())
    }
}

impl IntegrityRepair {
    pub fn new(sum_min: f64, sum_max: f64, edge_tolerance: f64) -> Self {
        Self {
            sum_min,
            sum_max,
            edge_tolerance,
        }
    }

    pub fn from_config(config: &RepairConfig) -> Self {
        Self::new(config.sum_min, config.sum_max, config.edge_tolerance)
    }

    fn check(
        &self,
        model: &ModelProbability,
        fair: Option<&MarketProbability>,
        selection: Outcome,
        stored_edge: Option<f64>,
    ) -> Vec<IssueKind> {
        let mut kinds = vec![];

        let sum = model.total();
        if !sum.is_finite() || sum < self.sum_min || sum > self.sum_max {
            kinds.push(IssueKind::ProbabilitySum { sum });
        }
        if model.iter().any(|(_, p)| p < 0.0) {
            kinds.push(IssueKind::NegativeProbability);
        }
        if let Some(fair) = fair {
            let sum = fair.total();
            if !sum.is_finite() || (sum - 100.0).abs() > FAIR_SUM_TOLERANCE {
                kinds.push(IssueKind::MarketSum { sum });
            }
        }

        let expected = model
            .get(selection)
            .zip(fair.and_then(|f| f.get(selection)))
            .map(|(m, f)| round2(m - f));
        let drifted = match (stored_edge, expected) {
            (Some(stored), Some(expected)) => (stored - expected).abs() > self.edge_tolerance,
            (None, None) => false,
            _ => true,
        };
        if drifted {
            kinds.push(IssueKind::EdgeDrift {
                stored: stored_edge,
                expected,
            });
        }

        kinds
    }

    /// Consistency violations of one entry; empty when healthy
    pub fn scan(&self, entry: &PredictionLedgerEntry) -> Vec<IssueKind> {
        self.check(
            &entry.model_probability,
            entry.market_probability_fair.as_ref(),
            entry.selection,
            entry.edge_value,
        )
    }

    /// Patch restoring `entry` from `snapshot`
    fn plan(
        &self,
        entry: &PredictionLedgerEntry,
        snapshot: Option<&AnalysisSnapshot>,
    ) -> Result<RepairPatch, UnrepairableReason> {
        let snapshot = snapshot.ok_or(UnrepairableReason::NoSnapshot)?;
        if snapshot.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(UnrepairableReason::UnsupportedSchema(snapshot.schema_version));
        }

        let intel = &snapshot.intel;
        if intel.match_id != entry.match_id
            || snapshot.model_version != entry.model_version
            || intel.selection != entry.selection
        {
            return Err(UnrepairableReason::SnapshotMismatch);
        }

        let snapshot_kinds = self.check(
            &intel.model_probability,
            intel.market_probability_fair.as_ref(),
            intel.selection,
            intel.edge_value,
        );
        if !snapshot_kinds.is_empty() {
            return Err(UnrepairableReason::SnapshotCorrupt);
        }

        let patch = RepairPatch {
            model_probability: Some(intel.model_probability),
            market: Some((intel.market_probability_raw, intel.market_probability_fair)),
            edge: Some((intel.edge_value, intel.edge_bucket)),
            planned_against: Some(entry.prediction_timestamp),
        };

        let mut trial = entry.clone();
        let trial_ok = trial.apply_repair(&patch).is_ok() && self.scan(&trial).is_empty();
        if !trial_ok {
            return Err(UnrepairableReason::SnapshotCorrupt);
        }
        Ok(patch)
    }

    fn evaluate(
        &self,
        entry: &PredictionLedgerEntry,
        snapshots: &SnapshotIndex,
    ) -> Option<(Vec<IssueKind>, Result<RepairPatch, UnrepairableReason>)> {
        let kinds = self.scan(entry);
        if kinds.is_empty() {
            return None;
        }
        Some((kinds, self.plan(entry, snapshots.get(&entry.key()))))
    }

    /// Repair entries in place
    pub fn repair(
        &self,
        entries: &mut [PredictionLedgerEntry],
        snapshots: &SnapshotIndex,
    ) -> RepairReport {
        let mut report = RepairReport::default();
        for entry in entries.iter_mut() {
            report.scanned += 1;
            let Some((kinds, plan)) = self.evaluate(entry, snapshots) else {
                continue;
            };
            let status = match plan.map(|patch| entry.apply_repair(&patch)) {
                Ok(Ok(changes)) => IssueStatus::Fixed { changes },
                Ok(Err(_)) => IssueStatus::Unrepairable {
                    reason: UnrepairableReason::EntryChanged,
                },
                Err(reason) => IssueStatus::Unrepairable { reason },
            };
            record_issue(&mut report, entry, kinds, status);
        }
        log_summary(&report);
        report
    }

    /// Repair every entry of a store.
    ///
    /// Without an explicit index, each entry's embedded snapshot is used.
    /// Writes are conditional on the entry not having been re-recorded
    /// since it was read; such entries are reported as `EntryChanged`.
    pub async fn repair_store<S: LedgerStore>(
        &self,
        store: &S,
        snapshots: Option<&SnapshotIndex>,
    ) -> Result<RepairReport, LedgerError> {
        let entries = store.query(&LedgerQuery::new()).await?;
        let embedded;
        let snapshots = match snapshots {
            Some(index) => index,
            None => {
                embedded = snapshots_from_entries(&entries);
                &embedded
            }
        };

        let mut report = RepairReport::default();
        for entry in &entries {
            report.scanned += 1;
            let Some((kinds, plan)) = self.evaluate(entry, snapshots) else {
                continue;
            };
            let status = match plan {
                Ok(patch) => match store.apply_repair(entry.id, &patch).await {
                    Ok(changes) => IssueStatus::Fixed { changes },
                    Err(LedgerError::StateConflict { .. }) => IssueStatus::Unrepairable {
                        reason: UnrepairableReason::EntryChanged,
                    },
                    Err(e) => return Err(e),
                },
                Err(reason) => IssueStatus::Unrepairable { reason },
            };
            record_issue(&mut report, entry, kinds, status);
        }
        log_summary(&report);
        Ok(report)
    }
}

fn record_issue(
    report: &mut RepairReport,
    entry: &PredictionLedgerEntry,
    kinds: Vec<IssueKind>,
    status: IssueStatus,
) {
    match &status {
        IssueStatus::Fixed { changes } => {
            report.fixed_count += 1;
            increment_counter(CounterMetric::Repair, "fixed");
            for change in changes {
                tracing::warn!(
                    ledger_id = %entry.id,
                    match_id = %entry.match_id,
                    field = change.field,
                    old = %change.before,
                    new = %change.after,
                    "Repaired ledger field"
                );
            }
        }
        IssueStatus::Unrepairable { reason } => {
            increment_counter(CounterMetric::Repair, reason.as_str());
            tracing::warn!(
                ledger_id = %entry.id,
                match_id = %entry.match_id,
                reason = reason.as_str(),
                issues = ?kinds,
                "Ledger entry unrepairable"
            );
        }
    }
    report.issues.push(RepairIssue {
        ledger_id: entry.id,
        match_id: entry.match_id.clone(),
        kinds,
        status,
    });
}

fn log_summary(report: &RepairReport) {
    tracing::info!(
        scanned = report.scanned,
        fixed = report.fixed_count,
        unrepairable = report.unrepairable_count(),
        "Integrity repair finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgeBucket;
    use crate::ledger::test_support::create_test_entry;
    use crate::ledger::InMemoryLedger;
    use crate::model::Confidence;
    use chrono::{Duration, Utc};

    fn create_test_probability(home: f64, draw: f64, away: f64) -> ModelProbability {
        ModelProbability {
            home,
            draw: Some(draw),
            away,
            confidence: Confidence::Standard,
        }
    }

    /// Entry whose snapshot holds {58, 24, 18} and whose stored copy holds
    /// the same values as fractions
    fn create_test_fraction_entry() -> PredictionLedgerEntry {
        let mut entry = create_test_entry("m-frac", Utc::now() + Duration::days(1));
        let fair_home = entry
            .market_probability_fair
            .and_then(|f| f.get(Outcome::Home))
            .unwrap();
        let edge = round2(58.0 - fair_home);

        entry.selection = Outcome::Home;
        entry.snapshot.intel.selection = Outcome::Home;
        entry.snapshot.intel.model_probability = create_test_probability(58.0, 24.0, 18.0);
        entry.snapshot.intel.edge_value = Some(edge);
        entry.snapshot.intel.edge_bucket = EdgeBucket::Medium;

        entry.model_probability = create_test_probability(0.58, 0.24, 0.18);
        entry.edge_value = Some(edge);
        entry.edge_bucket = EdgeBucket::Medium;
        entry
    }

    #[test]
    fn test_healthy_entry_passes() {
        let entry = create_test_entry("m-1", Utc::now() + Duration::days(1));
        assert!(IntegrityRepair::default().scan(&entry).is_empty());
    }

    #[test]
    fn test_fraction_probabilities_detected_and_fixed() {
        let repair = IntegrityRepair::default();
        let mut entries = vec![create_test_fraction_entry()];

        let kinds = repair.scan(&entries[0]);
        assert!(matches!(kinds[0], IssueKind::ProbabilitySum { sum } if (sum - 1.0).abs() < 1e-9));

        let snapshots = snapshots_from_entries(&entries);
        let report = repair.repair(&mut entries, &snapshots);
        assert_eq!(report.fixed_count, 1);
        assert_eq!(entries[0].model_probability.home, 58.0);
        assert_eq!(entries[0].model_probability.draw, Some(24.0));
        assert_eq!(entries[0].model_probability.away, 18.0);

        // A second pass finds nothing to do
        let again = repair.repair(&mut entries, &snapshots);
        assert!(again.is_clean());
        assert_eq!(again.fixed_count, 0);
    }

    #[test]
    fn test_no_snapshot_is_unrepairable() {
        let repair = IntegrityRepair::default();
        let mut entries = vec![create_test_fraction_entry()];
        let before = entries[0].clone();

        let report = repair.repair(&mut entries, &SnapshotIndex::new());
        assert_eq!(report.fixed_count, 0);
        assert_eq!(
            report.issues[0].status,
            IssueStatus::Unrepairable {
                reason: UnrepairableReason::NoSnapshot
            }
        );
        assert_eq!(entries[0], before);
    }

    #[test]
    fn test_corrupt_snapshot_is_unrepairable() {
        let repair = IntegrityRepair::default();
        let mut entry = create_test_fraction_entry();
        entry.snapshot.intel.model_probability = create_test_probability(0.58, 0.24, 0.18);
        let mut entries = vec![entry];

        let snapshots = snapshots_from_entries(&entries);
        let report = repair.repair(&mut entries, &snapshots);
        assert_eq!(
            report.issues[0].status,
            IssueStatus::Unrepairable {
                reason: UnrepairableReason::SnapshotCorrupt
            }
        );
        assert_eq!(entries[0].model_probability.home, 0.58);
    }

    #[test]
    fn test_unsupported_schema() {
        let repair = IntegrityRepair::default();
        let mut entry = create_test_fraction_entry();
        entry.snapshot.schema_version = SNAPSHOT_SCHEMA_VERSION + 1;
        let mut entries = vec![entry];

        let snapshots = snapshots_from_entries(&entries);
        let report = repair.repair(&mut entries, &snapshots);
        assert_eq!(
            report.issues[0].status,
            IssueStatus::Unrepairable {
                reason: UnrepairableReason::UnsupportedSchema(SNAPSHOT_SCHEMA_VERSION + 1)
            }
        );
    }

    #[test]
    fn test_edge_drift_restored() {
        let repair = IntegrityRepair::default();
        let mut entry = create_test_entry("m-1", Utc::now() + Duration::days(1));
        let original = entry.edge_value;
        entry.edge_value = original.map(|e| e + 3.0);
        let mut entries = vec![entry];

        let snapshots = snapshots_from_entries(&entries);
        let report = repair.repair(&mut entries, &snapshots);
        assert_eq!(report.fixed_count, 1);
        assert_eq!(entries[0].edge_value, original);
    }

    #[test]
    fn test_fraction_fair_market_restored() {
        let repair = IntegrityRepair::default();
        let mut entry = create_test_entry("m-1", Utc::now() + Duration::days(1));
        let authoritative = entry.market_probability_fair;
        entry.market_probability_fair = authoritative.map(|f| MarketProbability {
            home: f.home.map(|p| p / 100.0),
            draw: f.draw.map(|p| p / 100.0),
            away: f.away.map(|p| p / 100.0),
        });
        let mut entries = vec![entry];

        let kinds = repair.scan(&entries[0]);
        assert!(kinds
            .iter()
            .any(|k| matches!(k, IssueKind::MarketSum { sum } if (sum - 1.0).abs() < 0.01)));

        let snapshots = snapshots_from_entries(&entries);
        let report = repair.repair(&mut entries, &snapshots);
        assert_eq!(report.fixed_count, 1);
        match &report.issues[0].status {
            IssueStatus::Fixed { changes } => {
                assert!(changes.iter().any(|c| c.field == "market_probability_fair"))
            }
            other => panic!("expected fixed, got {:?}", other),
        }
        assert_eq!(entries[0].market_probability_fair, authoritative);
        assert!(repair.scan(&entries[0]).is_empty());
    }

    #[tokio::test]
    async fn test_store_refuses_patch_planned_before_re_record() {
        let entry = create_test_fraction_entry();
        let read = entry.clone();
        let store = InMemoryLedger::from_entries(vec![entry]).unwrap();

        let repair = IntegrityRepair::default();
        let patch = repair.plan(&read, Some(&read.snapshot)).unwrap();

        // A re-analysis lands between the read and the write
        let mut newer = create_test_entry("m-frac", read.kickoff);
        newer.prediction_timestamp = read.prediction_timestamp + Duration::minutes(5);
        store.upsert_pending(newer.clone()).await.unwrap();

        let result = store.apply_repair(read.id, &patch).await;
        assert!(matches!(result, Err(LedgerError::StateConflict { .. })));

        let stored = store.get(read.id).await.unwrap();
        assert_eq!(stored.model_probability, newer.model_probability);
        assert_eq!(stored.prediction_timestamp, newer.prediction_timestamp);
    }

    #[tokio::test]
    async fn test_repair_store_fixes_settled_entries() {
        let store = InMemoryLedger::from_entries(vec![create_test_fraction_entry()]).unwrap();
        let id = store.entries().await[0].id;
        store
            .settle(
                id,
                &crate::ledger::Resolution::Voided {
                    reason: "abandoned".to_string(),
                },
                Utc::now(),
            )
            .await
            .unwrap();

        let repair = IntegrityRepair::default();
        let report = repair.repair_store(&store, None).await.unwrap();
        assert_eq!(report.fixed_count, 1);

        let entry = store.get(id).await.unwrap();
        assert_eq!(entry.model_probability.home, 58.0);
        assert!(entry.is_terminal());

        let again = repair.repair_store(&store, None).await.unwrap();
        assert!(again.is_clean());
    }
}
