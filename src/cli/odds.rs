//! Odds command implementation

use super::{open_ledger, read_json, save_ledger};
use crate::config::Config;
use crate::ledger::{LedgerKey, LedgerStore, OddsSnapshot, PredictionLedger};
use clap::Args;
use serde::Deserialize;
use std::path::PathBuf;

/// One observed snapshot for a match
#[derive(Debug, Deserialize)]
struct OddsObservation {
    match_id: String,
    #[serde(flatten)]
    snapshot: OddsSnapshot,
}

#[derive(Args, Debug)]
pub struct OddsArgs {
    /// JSON file with an array of `{match_id, odds, observed_at}` records
    #[arg(long)]
    pub input: PathBuf,

    /// Model version the snapshots apply to (defaults to the configured one)
    #[arg(long)]
    pub model_version: Option<String>,
}

impl OddsArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let observations: Vec<OddsObservation> = read_json(&self.input)?;
        let model_version = self
            .model_version
            .clone()
            .unwrap_or_else(|| config.model.version.clone());

        let store = open_ledger(config)?;
        let ledger = PredictionLedger::new(store.clone(), config.ledger.closing_window());

        let mut attached = 0;
        for observation in &observations {
            let key = LedgerKey::new(observation.match_id.clone(), model_version.clone());
            let Some(entry) = store.find(&key).await? else {
                tracing::warn!(key = %key, "No prediction for odds snapshot");
                continue;
            };
            if ledger.attach_odds(entry.id, &observation.snapshot).await.is_ok() {
                attached += 1;
            }
        }

        save_ledger(config, &store).await?;
        println!("Attached {} of {} odds snapshots", attached, observations.len());
        Ok(())
    }
}
