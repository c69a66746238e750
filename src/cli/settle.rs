//! Settle command implementation

use super::{open_ledger, read_json, save_ledger};
use crate::config::Config;
use crate::tracker::{OutcomeTracker, ResultReport, Settlement};
use chrono::Utc;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct SettleArgs {
    /// JSON file with an array of result reports
    #[arg(long)]
    pub input: PathBuf,
}

impl SettleArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let reports: Vec<ResultReport> = read_json(&self.input)?;

        let store = open_ledger(config)?;
        let tracker = OutcomeTracker::new(store.clone(), config.ledger.closing_window());
        let now = Utc::now();

        let (mut settled, mut deferred, mut rejected) = (0, 0, 0);
        for report in &reports {
            for (id, result) in tracker.process(report, now).await? {
                match result {
                    Ok(Settlement::Settled(outcome)) => {
                        settled += 1;
                        println!("{:<20} {} {}", report.match_id, id, outcome);
                    }
                    Ok(Settlement::Deferred(reason)) => {
                        deferred += 1;
                        println!("{:<20} {} deferred ({})", report.match_id, id, reason);
                    }
                    Err(_) => rejected += 1,
                }
            }
        }

        save_ledger(config, &store).await?;
        println!(
            "Settled {}, deferred {}, rejected {} from {} reports",
            settled,
            deferred,
            rejected,
            reports.len()
        );
        Ok(())
    }
}
