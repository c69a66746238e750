//! JSON ledger file

use super::types::PredictionLedgerEntry;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current on-disk format version
pub const LEDGER_FILE_VERSION: u32 = 1;

/// On-disk ledger document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerFile {
    pub version: u32,
    pub entries: Vec<PredictionLedgerEntry>,
}

/// Read ledger entries; a missing file is an empty ledger
pub fn load_entries(path: impl AsRef<Path>) -> anyhow::Result<Vec<PredictionLedgerEntry>> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No ledger file, starting empty");
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read ledger {}", path.display()))?;
    let file: LedgerFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse ledger {}", path.display()))?;
    if file.version != LEDGER_FILE_VERSION {
        anyhow::bail!(
            "Unsupported ledger file version {} in {}",
            file.version,
            path.display()
        );
    }
    tracing::info!(path = %path.display(), entries = file.entries.len(), "Loaded ledger");
    Ok(file.entries)
}

/// Write ledger entries, replacing the file atomically
pub fn save_entries(path: impl AsRef<Path>, entries: &[PredictionLedgerEntry]) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = LedgerFile {
        version: LEDGER_FILE_VERSION,
        entries: entries.to_vec(),
    };
    let json = serde_json::to_string_pretty(&file)?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace ledger {}", path.display()))?;

    tracing::info!(path = %path.display(), entries = entries.len(), "Saved ledger");
    Ok(())
}
