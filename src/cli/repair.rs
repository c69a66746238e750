//! Repair command implementation

use super::{open_ledger, read_json, save_ledger, OutputFormat};
use crate::config::Config;
use crate::pipeline::AnalysisSnapshot;
use crate::repair::{snapshots_from_list, IntegrityRepair, IssueStatus};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RepairArgs {
    /// JSON file with authoritative analysis snapshots; defaults to the
    /// snapshots embedded in each entry
    #[arg(long)]
    pub snapshots: Option<PathBuf>,

    /// Report issues without writing repairs
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

impl RepairArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let index = match &self.snapshots {
            Some(path) => Some(snapshots_from_list(read_json::<Vec<AnalysisSnapshot>>(path)?)),
            None => None,
        };
        let repair = IntegrityRepair::from_config(&config.repair);

        let report = if self.dry_run {
            let mut entries = open_ledger(config)?.entries().await;
            let index = match index {
                Some(index) => index,
                None => crate::repair::snapshots_from_entries(&entries),
            };
            repair.repair(&mut entries, &index)
        } else {
            let store = open_ledger(config)?;
            let report = repair.repair_store(store.as_ref(), index.as_ref()).await?;
            if report.fixed_count > 0 {
                save_ledger(config, &store).await?;
            }
            report
        };

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Table => {
                for issue in &report.issues {
                    let kinds: Vec<String> = issue.kinds.iter().map(|k| k.to_string()).collect();
                    let status = match &issue.status {
                        IssueStatus::Fixed { changes } => format!("fixed ({} fields)", changes.len()),
                        IssueStatus::Unrepairable { reason } => {
                            format!("unrepairable ({})", reason.as_str())
                        }
                    };
                    println!(
                        "{:<20} {} {} [{}]",
                        issue.match_id,
                        issue.ledger_id,
                        status,
                        kinds.join(", ")
                    );
                }
                println!(
                    "Scanned {}, fixed {}, unrepairable {}{}",
                    report.scanned,
                    report.fixed_count,
                    report.unrepairable_count(),
                    if self.dry_run { " (dry run)" } else { "" }
                );
            }
        }
        Ok(())
    }
}
