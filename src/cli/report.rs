//! Report command implementation

use super::open_ledger;
use crate::config::Config;
use crate::ledger::{LedgerQuery, LedgerStore};
use crate::signal::Sport;
use crate::tracker::PerformanceSummary;
use chrono::{DateTime, Utc};
use clap::Args;

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Sport key, e.g. `soccer`
    #[arg(long)]
    pub sport: Option<String>,

    /// Model version filter
    #[arg(long)]
    pub model_version: Option<String>,

    /// Kickoff lower bound (RFC 3339)
    #[arg(long)]
    pub from: Option<DateTime<Utc>>,

    /// Kickoff upper bound (RFC 3339, exclusive)
    #[arg(long)]
    pub to: Option<DateTime<Utc>>,

    /// Minimum edge in percentage points
    #[arg(long)]
    pub min_edge: Option<f64>,
}

impl ReportArgs {
    pub fn query(&self) -> LedgerQuery {
        LedgerQuery {
            sport: self.sport.as_deref().map(Sport::from_key),
            model_version: self.model_version.clone(),
            kickoff_from: self.from,
            kickoff_to: self.to,
            min_edge: self.min_edge,
            ..Default::default()
        }
    }

    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let store = open_ledger(config)?;
        let entries = store.query(&self.query()).await?;
        let summary = PerformanceSummary::from_entries(&entries);
        println!("{}", summary.format_table());
        Ok(())
    }
}
