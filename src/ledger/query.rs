//! Ledger queries

use super::types::{PredictionLedgerEntry, PredictionOutcome};
use crate::signal::Sport;
use chrono::{DateTime, Utc};

/// Filter over ledger entries; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct LedgerQuery {
    pub match_id: Option<String>,
    pub model_version: Option<String>,
    pub sport: Option<Sport>,
    /// Inclusive lower kickoff bound
    pub kickoff_from: Option<DateTime<Utc>>,
    /// Exclusive upper kickoff bound
    pub kickoff_to: Option<DateTime<Utc>>,
    /// Minimum signed edge; entries without an edge never match
    pub min_edge: Option<f64>,
    pub outcome: Option<PredictionOutcome>,
}

impl LedgerQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn match_id(mut self, match_id: impl Into<String>) -> Self {
        self.match_id = Some(match_id.into());
        self
    }

    pub fn model_version(mut self, model_version: impl Into<String>) -> Self {
        self.model_version = Some(model_version.into());
        self
    }

    pub fn sport(mut self, sport: Sport) -> Self {
        self.sport = Some(sport);
        self
    }

    pub fn kickoff_between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.kickoff_from = Some(from);
        self.kickoff_to = Some(to);
        self
    }

    pub fn min_edge(mut self, min_edge: f64) -> Self {
        self.min_edge = Some(min_edge);
        self
    }

    pub fn outcome(mut self, outcome: PredictionOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    pub fn matches(&self, entry: &PredictionLedgerEntry) -> bool {
        self.match_id.as_ref().map_or(true, |m| *m == entry.match_id)
            && self
                .model_version
                .as_ref()
                .map_or(true, |v| *v == entry.model_version)
            && self.sport.map_or(true, |s| s == entry.sport)
            && self.kickoff_from.map_or(true, |from| entry.kickoff >= from)
            && self.kickoff_to.map_or(true, |to| entry.kickoff < to)
            && self
                .min_edge
                .map_or(true, |min| entry.edge_value.is_some_and(|e| e >= min))
            && self.outcome.map_or(true, |o| o == entry.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::lifecycle::test_support::create_test_entry;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_empty_query_matches_all() {
        let entry = create_test_entry("m-1", Utc::now() + Duration::days(1));
        assert!(LedgerQuery::new().matches(&entry));
    }

    #[test]
    fn test_filters() {
        let kickoff = Utc.with_ymd_and_hms(2026, 11, 1, 15, 0, 0).unwrap();
        let mut entry = create_test_entry("m-1", kickoff);
        entry.edge_value = Some(4.0);

        assert!(LedgerQuery::new().match_id("m-1").matches(&entry));
        assert!(!LedgerQuery::new().match_id("m-2").matches(&entry));
        assert!(LedgerQuery::new().sport(Sport::Soccer).matches(&entry));
        assert!(!LedgerQuery::new().sport(Sport::Hockey).matches(&entry));
        assert!(LedgerQuery::new().min_edge(4.0).matches(&entry));
        assert!(!LedgerQuery::new().min_edge(4.5).matches(&entry));
        assert!(LedgerQuery::new()
            .outcome(PredictionOutcome::Pending)
            .matches(&entry));
        assert!(LedgerQuery::new()
            .kickoff_between(kickoff, kickoff + Duration::days(1))
            .matches(&entry));
        assert!(!LedgerQuery::new()
            .kickoff_between(kickoff - Duration::days(1), kickoff)
            .matches(&entry));

        entry.edge_value = None;
        assert!(!LedgerQuery::new().min_edge(-100.0).matches(&entry));
    }
}
