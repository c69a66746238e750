//! Export command implementation

use super::open_ledger;
use crate::config::Config;
use crate::data::LedgerParquetWriter;
use crate::ledger::{LedgerQuery, LedgerStore};
use chrono::Utc;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output directory for Parquet files
    #[arg(long, default_value = "./export")]
    pub output: PathBuf,

    /// Only export settled predictions
    #[arg(long)]
    pub settled_only: bool,
}

impl ExportArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let store = open_ledger(config)?;
        let mut entries = store.query(&LedgerQuery::new()).await?;
        if self.settled_only {
            entries.retain(|e| e.is_terminal());
        }

        let writer = LedgerParquetWriter::new(self.output.clone());
        let path = writer.file_path("ledger", Utc::now());
        writer.write_entries(&path, &entries)?;

        tracing::info!(path = ?path, count = entries.len(), "Exported ledger");
        println!("Exported {} entries to {}", entries.len(), path.display());
        Ok(())
    }
}
