//! Historical performance over ledger entries

use crate::edge::EdgeBucket;
use crate::ledger::{PredictionLedgerEntry, PredictionOutcome};
use std::collections::BTreeMap;

/// Settled record of one edge bucket
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BucketRecord {
    pub hits: usize,
    pub misses: usize,
}

impl BucketRecord {
    /// Hit rate in percent, `None` before anything settled
    pub fn hit_rate(&self) -> Option<f64> {
        let decided = self.hits + self.misses;
        (decided > 0).then(|| self.hits as f64 * 100.0 / decided as f64)
    }
}

/// Summary statistics over a set of ledger entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceSummary {
    pub total: usize,
    pub hits: usize,
    pub misses: usize,
    pub pushes: usize,
    pub pending: usize,
    /// Hit rate in percent over HIT and MISS entries
    pub hit_rate: Option<f64>,
    /// Mean edge of entries with an edge, in points
    pub avg_edge: Option<f64>,
    /// Mean CLV of entries with a closing price, in points
    pub avg_clv: Option<f64>,
    /// Share of CLV-bearing entries whose CLV is positive, in percent
    pub positive_clv_share: Option<f64>,
    pub by_bucket: BTreeMap<EdgeBucket, BucketRecord>,
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

impl PerformanceSummary {
    pub fn from_entries(entries: &[PredictionLedgerEntry]) -> Self {
        let mut summary = PerformanceSummary {
            total: entries.len(),
            ..Default::default()
        };
        let mut edges = vec![];
        let mut clvs = vec![];

        for entry in entries {
            let record = summary.by_bucket.entry(entry.edge_bucket).or_default();
            match entry.outcome {
                PredictionOutcome::Hit => {
                    summary.hits += 1;
                    record.hits += 1;
                }
                PredictionOutcome::Miss => {
                    summary.misses += 1;
                    record.misses += 1;
                }
                PredictionOutcome::Push => summary.pushes += 1,
                PredictionOutcome::Pending => summary.pending += 1,
            }
            edges.extend(entry.edge_value);
            clvs.extend(entry.clv_value);
        }

        summary.hit_rate = BucketRecord {
            hits: summary.hits,
            misses: summary.misses,
        }
        .hit_rate();
        summary.avg_edge = mean(&edges);
        summary.avg_clv = mean(&clvs);
        summary.positive_clv_share = (!clvs.is_empty())
            .then(|| clvs.iter().filter(|c| **c > 0.0).count() as f64 * 100.0 / clvs.len() as f64);
        summary
    }

    /// Format as table for CLI output
    pub fn format_table(&self) -> String {
        let pct = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{:.1}%", v));
        let points = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{:+.2} pp", v));

        let mut buckets = String::new();
        for bucket in EdgeBucket::all() {
            let record = self.by_bucket.get(&bucket).copied().unwrap_or_default();
            buckets.push_str(&format!(
                "{:<18}{:>4} / {:<4} {}\n",
                format!("{}:", bucket),
                record.hits,
                record.hits + record.misses,
                pct(record.hit_rate()),
            ));
        }

        format!(
            r#"
══════════════════════════════════════════════════════
               PREDICTION PERFORMANCE
══════════════════════════════════════════════════════

RESULTS
───────────────────────────────────────────────────────
Predictions:      {}
Hit / Miss:       {} / {}
Push:             {}
Pending:          {}
Hit Rate:         {}

MARKET
───────────────────────────────────────────────────────
Avg Edge:         {}
Avg CLV:          {}
Positive CLV:     {}

HIT RATE BY BUCKET
───────────────────────────────────────────────────────
{}══════════════════════════════════════════════════════
"#,
            self.total,
            self.hits,
            self.misses,
            self.pushes,
            self.pending,
            pct(self.hit_rate),
            points(self.avg_edge),
            points(self.avg_clv),
            pct(self.positive_clv_share),
            buckets,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::test_support::create_test_entry;
    use chrono::{Duration, Utc};

    fn create_test_settled(
        match_id: &str,
        outcome: PredictionOutcome,
        bucket: EdgeBucket,
        clv: Option<f64>,
    ) -> PredictionLedgerEntry {
        let mut entry = create_test_entry(match_id, Utc::now() + Duration::days(1));
        entry.outcome = outcome;
        entry.edge_bucket = bucket;
        entry.clv_value = clv;
        entry
    }

    #[test]
    fn test_empty_summary() {
        let summary = PerformanceSummary::from_entries(&[]);
        assert_eq!(summary.total, 0);
        assert!(summary.hit_rate.is_none());
        assert!(summary.avg_clv.is_none());
        assert!(summary.format_table().contains("n/a"));
    }

    #[test]
    fn test_summary_counts() {
        let entries = vec![
            create_test_settled("a", PredictionOutcome::Hit, EdgeBucket::Medium, Some(2.0)),
            create_test_settled("b", PredictionOutcome::Miss, EdgeBucket::Medium, Some(-1.0)),
            create_test_settled("c", PredictionOutcome::Hit, EdgeBucket::High, None),
            create_test_settled("d", PredictionOutcome::Push, EdgeBucket::Small, None),
            create_test_settled("e", PredictionOutcome::Pending, EdgeBucket::NoEdge, None),
        ];
        let summary = PerformanceSummary::from_entries(&entries);

        assert_eq!(summary.total, 5);
        assert_eq!((summary.hits, summary.misses), (2, 1));
        assert_eq!((summary.pushes, summary.pending), (1, 1));
        assert!((summary.hit_rate.unwrap() - 66.666).abs() < 0.01);
        assert_eq!(summary.avg_clv, Some(0.5));
        assert_eq!(summary.positive_clv_share, Some(50.0));
        assert_eq!(
            summary.by_bucket[&EdgeBucket::Medium].hit_rate(),
            Some(50.0)
        );
        assert_eq!(summary.by_bucket[&EdgeBucket::High].hit_rate(), Some(100.0));
        // Pushes never count toward a hit rate
        assert_eq!(summary.by_bucket[&EdgeBucket::Small].hit_rate(), None);

        let table = summary.format_table();
        assert!(table.contains("PREDICTION PERFORMANCE"));
        assert!(table.contains("MEDIUM:"));
    }
}
