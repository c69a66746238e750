//! Ledger service: logging and metrics around a store

use super::query::LedgerQuery;
use super::types::{
    LedgerError, LedgerId, OddsAttachment, OddsSnapshot, PredictionLedgerEntry,
};
use super::LedgerStore;
use crate::pipeline::Analysis;
use crate::telemetry::{increment_counter, CounterMetric};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Records predictions and odds snapshots
pub struct PredictionLedger<S: LedgerStore> {
    store: Arc<S>,
    closing_window: Duration,
}

impl<S: LedgerStore> Clone for PredictionLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            closing_window: self.closing_window,
        }
    }
}

impl<S: LedgerStore> PredictionLedger<S> {
    pub fn new(store: Arc<S>, closing_window: Duration) -> Self {
        Self {
            store,
            closing_window,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn closing_window(&self) -> Duration {
        self.closing_window
    }

    /// Record an analysis as a PENDING prediction
    pub async fn record_analysis(
        &self,
        analysis: &Analysis,
        predicted_at: DateTime<Utc>,
    ) -> Result<LedgerId, LedgerError> {
        self.record_prediction(PredictionLedgerEntry::from_analysis(analysis, predicted_at))
            .await
    }

    /// Insert or replace the PENDING entry for this match and model version
    pub async fn record_prediction(
        &self,
        entry: PredictionLedgerEntry,
    ) -> Result<LedgerId, LedgerError> {
        let key = entry.key();
        let selection = entry.selection;
        let bucket = entry.edge_bucket;
        match self.store.upsert_pending(entry).await {
            Ok(id) => {
                increment_counter(CounterMetric::LedgerWrite, "record");
                tracing::info!(
                    ledger_id = %id,
                    key = %key,
                    selection = selection.as_str(),
                    bucket = bucket.as_str(),
                    "Prediction recorded"
                );
                Ok(id)
            }
            Err(e) => {
                increment_counter(CounterMetric::LedgerWrite, "rejected");
                tracing::warn!(key = %key, error = %e, "Prediction rejected");
                Err(e)
            }
        }
    }

    /// Attach an observed odds snapshot to a PENDING entry
    pub async fn attach_odds(
        &self,
        id: LedgerId,
        snapshot: &OddsSnapshot,
    ) -> Result<OddsAttachment, LedgerError> {
        match self.store.attach_odds(id, snapshot, self.closing_window).await {
            Ok(attachment) => {
                increment_counter(CounterMetric::LedgerWrite, "odds");
                tracing::info!(
                    ledger_id = %id,
                    opening_set = attachment.opening_set,
                    closing_set = attachment.closing_set,
                    clv = ?attachment.clv_value,
                    "Odds snapshot attached"
                );
                Ok(attachment)
            }
            Err(e) => {
                increment_counter(CounterMetric::LedgerWrite, "rejected");
                tracing::warn!(ledger_id = %id, error = %e, "Odds snapshot rejected");
                Err(e)
            }
        }
    }

    pub async fn get(&self, id: LedgerId) -> Result<PredictionLedgerEntry, LedgerError> {
        self.store.get(id).await
    }

    pub async fn query(&self, query: &LedgerQuery) -> Result<Vec<PredictionLedgerEntry>, LedgerError> {
        self.store.query(query).await
    }
}
