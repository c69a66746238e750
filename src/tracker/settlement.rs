//! Settlement of ledger entries against reported results

use crate::ledger::{
    ActualScore, LedgerError, LedgerId, LedgerQuery, LedgerStore, OddsSnapshot,
    PredictionLedgerEntry, PredictionOutcome, Resolution,
};
use crate::signal::OutcomeSpace;
use crate::telemetry::{increment_counter, CounterMetric};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Result status reported by the results feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    /// Match completed; the score is final
    Final,
    /// Match postponed, abandoned or otherwise voided
    Void,
}

/// One result feed record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultReport {
    pub match_id: String,
    pub status: ResultStatus,
    /// Final score, `"2-1"`
    #[serde(default)]
    pub score: Option<String>,
    #[serde(default)]
    pub void_reason: Option<String>,
    /// Last odds observed shortly before kickoff
    #[serde(default)]
    pub closing_odds: Option<OddsSnapshot>,
}

/// Why a settlement was postponed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferReason {
    MissingScore,
    MalformedScore(String),
    /// Level score in a market without a draw
    TieInTwoWay,
}

impl DeferReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeferReason::MissingScore => "missing_score",
            DeferReason::MalformedScore(_) => "malformed_score",
            DeferReason::TieInTwoWay => "tie_in_two_way",
        }
    }
}

impl fmt::Display for DeferReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeferReason::MalformedScore(detail) => write!(f, "malformed_score: {}", detail),
            other => f.write_str(other.as_str()),
        }
    }
}

/// What settlement did with an entry
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Settled(PredictionOutcome),
    /// Entry stays PENDING
    Deferred(DeferReason),
}

/// Resolution for an entry from a score.
///
/// HIT when the realized winner is the selection, MISS otherwise. A level
/// score is only a result where the draw is an outcome.
pub fn resolve_score(
    entry: &PredictionLedgerEntry,
    score: ActualScore,
) -> Result<Resolution, DeferReason> {
    let winner = score.winner();
    let space = entry.snapshot.signals.outcome_space;
    if space == OutcomeSpace::TwoWay && score.home == score.away {
        return Err(DeferReason::TieInTwoWay);
    }
    let outcome = if winner == entry.selection {
        PredictionOutcome::Hit
    } else {
        PredictionOutcome::Miss
    };
    Ok(Resolution::Settled { outcome, score })
}

/// Resolution for an entry from a feed record.
///
/// PUSH only comes from an explicit void; it is never inferred from a score.
pub fn resolve_report(
    entry: &PredictionLedgerEntry,
    report: &ResultReport,
) -> Result<Resolution, DeferReason> {
    match report.status {
        ResultStatus::Void => Ok(Resolution::Voided {
            reason: report
                .void_reason
                .clone()
                .unwrap_or_else(|| "void".to_string()),
        }),
        ResultStatus::Final => {
            let raw = report.score.as_deref().ok_or(DeferReason::MissingScore)?;
            let score = raw
                .parse::<ActualScore>()
                .map_err(DeferReason::MalformedScore)?;
            resolve_score(entry, score)
        }
    }
}

/// Settles ledger entries and captures closing odds
pub struct OutcomeTracker<S: LedgerStore> {
    store: Arc<S>,
    closing_window: Duration,
}

impl<S: LedgerStore> OutcomeTracker<S> {
    pub fn new(store: Arc<S>, closing_window: Duration) -> Self {
        Self {
            store,
            closing_window,
        }
    }

    /// Settle one entry with a final score
    pub async fn settle(
        &self,
        id: LedgerId,
        score: Option<&str>,
        settled_at: DateTime<Utc>,
    ) -> Result<Settlement, LedgerError> {
        let report = ResultReport {
            match_id: String::new(),
            status: ResultStatus::Final,
            score: score.map(str::to_string),
            void_reason: None,
            closing_odds: None,
        };
        self.settle_report(id, &report, settled_at).await
    }

    /// Void one entry
    pub async fn void(
        &self,
        id: LedgerId,
        reason: &str,
        settled_at: DateTime<Utc>,
    ) -> Result<Settlement, LedgerError> {
        let resolution = Resolution::Voided {
            reason: reason.to_string(),
        };
        self.apply(id, &resolution, settled_at).await
    }

    /// Settle one entry from a feed record
    pub async fn settle_report(
        &self,
        id: LedgerId,
        report: &ResultReport,
        settled_at: DateTime<Utc>,
    ) -> Result<Settlement, LedgerError> {
        let entry = self.store.get(id).await?;
        if entry.is_terminal() {
            tracing::warn!(ledger_id = %id, state = %entry.outcome, "Entry already settled");
            return Err(LedgerError::StateConflict {
                id,
                state: entry.outcome,
                reason: "entry already settled",
            });
        }

        match resolve_report(&entry, report) {
            Ok(resolution) => self.apply(id, &resolution, settled_at).await,
            Err(reason) => {
                increment_counter(CounterMetric::Settlement, "deferred");
                tracing::warn!(
                    ledger_id = %id,
                    match_id = %entry.match_id,
                    reason = %reason,
                    "Settlement deferred"
                );
                Ok(Settlement::Deferred(reason))
            }
        }
    }

    async fn apply(
        &self,
        id: LedgerId,
        resolution: &Resolution,
        settled_at: DateTime<Utc>,
    ) -> Result<Settlement, LedgerError> {
        match self.store.settle(id, resolution, settled_at).await {
            Ok(outcome) => {
                increment_counter(CounterMetric::Settlement, outcome.as_str());
                tracing::info!(ledger_id = %id, outcome = %outcome, "Entry settled");
                Ok(Settlement::Settled(outcome))
            }
            Err(e) => {
                tracing::warn!(ledger_id = %id, error = %e, "Settlement rejected");
                Err(e)
            }
        }
    }

    /// Apply a feed record to every PENDING entry of its match.
    ///
    /// Closing odds are attached before settling. Per-entry failures are
    /// logged and reported without stopping the rest.
    pub async fn process(
        &self,
        report: &ResultReport,
        settled_at: DateTime<Utc>,
    ) -> Result<Vec<(LedgerId, Result<Settlement, LedgerError>)>, LedgerError> {
        let pending = self
            .store
            .query(
                &LedgerQuery::new()
                    .match_id(report.match_id.clone())
                    .outcome(PredictionOutcome::Pending),
            )
            .await?;

        let mut results = Vec::with_capacity(pending.len());
        for entry in pending {
            if let Some(snapshot) = &report.closing_odds {
                if let Err(e) = self
                    .store
                    .attach_odds(entry.id, snapshot, self.closing_window)
                    .await
                {
                    tracing::warn!(ledger_id = %entry.id, error = %e, "Closing odds not attached");
                }
            }
            let result = self.settle_report(entry.id, report, settled_at).await;
            results.push((entry.id, result));
        }
        Ok(results)
    }
}
