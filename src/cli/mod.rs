//! CLI interface for sports-edge
//!
//! Provides subcommands for:
//! - `analyze`: Analyze matches and record predictions
//! - `odds`: Attach observed odds snapshots
//! - `settle`: Settle predictions from result reports
//! - `repair`: Run integrity repair over the ledger
//! - `report`: Show historical performance
//! - `export`: Export the ledger to Parquet
//! - `config`: Show configuration

mod analyze;
mod export;
mod odds;
mod repair;
mod report;
mod settle;

pub use analyze::AnalyzeArgs;
pub use export::ExportArgs;
pub use odds::OddsArgs;
pub use repair::RepairArgs;
pub use report::ReportArgs;
pub use settle::SettleArgs;

use crate::config::Config;
use crate::ledger::{load_entries, save_entries, InMemoryLedger};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "sports-edge")]
#[command(about = "Sports match edge ranking and prediction ledger")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze matches and record predictions
    Analyze(AnalyzeArgs),
    /// Attach observed odds snapshots to pending predictions
    Odds(OddsArgs),
    /// Settle predictions from result reports
    Settle(SettleArgs),
    /// Run integrity repair over the ledger
    Repair(RepairArgs),
    /// Show historical performance
    Report(ReportArgs),
    /// Export the ledger to Parquet
    Export(ExportArgs),
    /// Show configuration
    Config,
}

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Read a JSON document from a file
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the configured ledger file into memory
pub(crate) fn open_ledger(config: &Config) -> anyhow::Result<Arc<InMemoryLedger>> {
    let entries = load_entries(&config.ledger.path)?;
    Ok(Arc::new(InMemoryLedger::from_entries(entries)?))
}

/// Persist the in-memory ledger back to the configured file
pub(crate) async fn save_ledger(config: &Config, ledger: &InMemoryLedger) -> anyhow::Result<()> {
    save_entries(&config.ledger.path, &ledger.entries().await)
}
