//! In-memory ledger store
//!
//! One write lock guards entries and the key index together, so every
//! conditional update is atomic with respect to concurrent writers.

use super::query::LedgerQuery;
use super::types::{
    FieldChange, LedgerError, LedgerId, LedgerKey, OddsAttachment, OddsSnapshot,
    PredictionLedgerEntry, PredictionOutcome, RepairPatch, Resolution,
};
use super::LedgerStore;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct LedgerState {
    entries: HashMap<LedgerId, PredictionLedgerEntry>,
    keys: HashMap<LedgerKey, LedgerId>,
}

impl LedgerState {
    fn entry_mut(&mut self, id: LedgerId) -> Result<&mut PredictionLedgerEntry, LedgerError> {
        self.entries.get_mut(&id).ok_or(LedgerError::NotFound(id))
    }
}

/// Ledger held in process memory
#[derive(Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted entries
    pub fn from_entries(entries: Vec<PredictionLedgerEntry>) -> Result<Self, LedgerError> {
        let mut state = LedgerState::default();
        for entry in entries {
            let key = entry.key();
            if state.keys.contains_key(&key) {
                return Err(LedgerError::DuplicateKey(key));
            }
            state.keys.insert(key, entry.id);
            state.entries.insert(entry.id, entry);
        }
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// All entries ordered by kickoff then match id
    pub async fn entries(&self) -> Vec<PredictionLedgerEntry> {
        let state = self.state.read().await;
        let mut entries: Vec<_> = state.entries.values().cloned().collect();
        sort_entries(&mut entries);
        entries
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }
}

fn sort_entries(entries: &mut [PredictionLedgerEntry]) {
    entries.sort_by(|a, b| {
        a.kickoff
            .cmp(&b.kickoff)
            .then_with(|| a.match_id.cmp(&b.match_id))
            .then_with(|| a.model_version.cmp(&b.model_version))
    });
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn upsert_pending(&self, entry: PredictionLedgerEntry) -> Result<LedgerId, LedgerError> {
        let mut state = self.state.write().await;
        let key = entry.key();

        if let Some(&id) = state.keys.get(&key) {
            let existing = state.entry_mut(id)?;
            existing.replace_prediction(entry)?;
            return Ok(id);
        }

        if entry.is_terminal() {
            return Err(LedgerError::StateConflict {
                id: entry.id,
                state: entry.outcome,
                reason: "new entries must be pending",
            });
        }
        if entry.prediction_timestamp >= entry.kickoff {
            return Err(LedgerError::MatchStarted {
                id: entry.id,
                kickoff: entry.kickoff,
            });
        }
        let id = entry.id;
        state.keys.insert(key, id);
        state.entries.insert(id, entry);
        Ok(id)
    }

    async fn get(&self, id: LedgerId) -> Result<PredictionLedgerEntry, LedgerError> {
        let state = self.state.read().await;
        state.entries.get(&id).cloned().ok_or(LedgerError::NotFound(id))
    }

    async fn find(&self, key: &LedgerKey) -> Result<Option<PredictionLedgerEntry>, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .keys
            .get(key)
            .and_then(|id| state.entries.get(id))
            .cloned())
    }

    async fn attach_odds(
        &self,
        id: LedgerId,
        snapshot: &OddsSnapshot,
        closing_window: Duration,
    ) -> Result<OddsAttachment, LedgerError> {
        let mut state = self.state.write().await;
        state
            .entry_mut(id)?
            .apply_odds_snapshot(snapshot, closing_window)
    }

    async fn settle(
        &self,
        id: LedgerId,
        resolution: &Resolution,
        settled_at: DateTime<Utc>,
    ) -> Result<PredictionOutcome, LedgerError> {
        let mut state = self.state.write().await;
        state.entry_mut(id)?.apply_resolution(resolution, settled_at)
    }

    async fn apply_repair(
        &self,
        id: LedgerId,
        patch: &RepairPatch,
    ) -> Result<Vec<FieldChange>, LedgerError> {
        let mut state = self.state.write().await;
        state.entry_mut(id)?.apply_repair(patch)
    }

    async fn query(&self, query: &LedgerQuery) -> Result<Vec<PredictionLedgerEntry>, LedgerError> {
        let state = self.state.read().await;
        let mut entries: Vec<_> = state
            .entries
            .values()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        sort_entries(&mut entries);
        Ok(entries)
    }
}
