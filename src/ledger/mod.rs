//! Prediction ledger
//!
//! Durable record of every analysis, keyed by match and model version, with
//! the PENDING -> {HIT, MISS, PUSH} lifecycle enforced on every write.

mod file;
mod lifecycle;
mod memory;
mod query;
mod service;
mod types;

pub use file::{load_entries, save_entries, LedgerFile, LEDGER_FILE_VERSION};
pub use memory::InMemoryLedger;
pub use query::LedgerQuery;
pub use service::PredictionLedger;
pub use types::{
    ActualScore, FieldChange, LedgerError, LedgerId, LedgerKey, OddsAttachment, OddsSnapshot,
    PredictionLedgerEntry, PredictionOutcome, RepairPatch, Resolution,
};

#[cfg(test)]
pub(crate) use lifecycle::test_support;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

/// Storage for ledger entries.
///
/// Implementations must apply each write atomically: a conditional update
/// either fully succeeds or leaves the entry unchanged.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert a PENDING entry or replace the PENDING entry with the same key
    async fn upsert_pending(&self, entry: PredictionLedgerEntry) -> Result<LedgerId, LedgerError>;

    async fn get(&self, id: LedgerId) -> Result<PredictionLedgerEntry, LedgerError>;

    async fn find(&self, key: &LedgerKey) -> Result<Option<PredictionLedgerEntry>, LedgerError>;

    /// Attach an odds snapshot to a PENDING entry
    async fn attach_odds(
        &self,
        id: LedgerId,
        snapshot: &OddsSnapshot,
        closing_window: Duration,
    ) -> Result<OddsAttachment, LedgerError>;

    /// Move a PENDING entry to its terminal state
    async fn settle(
        &self,
        id: LedgerId,
        resolution: &Resolution,
        settled_at: DateTime<Utc>,
    ) -> Result<PredictionOutcome, LedgerError>;

    /// Overwrite corrupted fields; the only write allowed on terminal entries.
    ///
    /// Refused with `StateConflict` when the patch was planned against an
    /// earlier recording of the entry.
    async fn apply_repair(
        &self,
        id: LedgerId,
        patch: &RepairPatch,
    ) -> Result<Vec<FieldChange>, LedgerError>;

    /// Entries matching `query`, ordered by kickoff
    async fn query(&self, query: &LedgerQuery) -> Result<Vec<PredictionLedgerEntry>, LedgerError>;
}
