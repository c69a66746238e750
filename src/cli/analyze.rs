//! Analyze command implementation

use super::{open_ledger, read_json, save_ledger, OutputFormat};
use crate::config::Config;
use crate::ledger::PredictionLedger;
use crate::pipeline::{Analyzer, MarketIntel};
use crate::signal::RawMatchInput;
use chrono::Utc;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// JSON file with an array of match inputs
    #[arg(long)]
    pub input: PathBuf,

    /// Analyze without recording predictions
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct AnalyzeRow {
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    intel: Option<MarketIntel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

impl AnalyzeArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let inputs: Vec<RawMatchInput> = read_json(&self.input)?;
        tracing::info!(path = ?self.input, matches = inputs.len(), "Analyzing matches");

        let analyzer = Analyzer::from_config(config);
        let items = analyzer.analyze_batch(&inputs);

        let store = open_ledger(config)?;
        let ledger = PredictionLedger::new(store.clone(), config.ledger.closing_window());
        let now = Utc::now();

        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            match item.result {
                Ok(analysis) => {
                    if !self.dry_run {
                        if let Err(e) = ledger.record_analysis(&analysis, now).await {
                            tracing::warn!(match_id = %item.match_id, error = %e, "Prediction not recorded");
                        }
                    }
                    rows.push(AnalyzeRow {
                        match_id: item.match_id,
                        intel: Some(analysis.intel),
                        reason: None,
                        message: None,
                    });
                }
                Err(e) => rows.push(AnalyzeRow {
                    match_id: item.match_id,
                    intel: None,
                    reason: Some(e.reason_code()),
                    message: Some(e.user_message()),
                }),
            }
        }

        if !self.dry_run {
            save_ledger(config, &store).await?;
        }

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
            OutputFormat::Table => print_table(&rows),
        }
        Ok(())
    }
}

fn print_table(rows: &[AnalyzeRow]) {
    println!(
        "{:<20} {:<6} {:>8} {:>8} {:>8} {:>8} {:<8}",
        "MATCH", "PICK", "MODEL", "FAIR", "EDGE", "BUCKET", "CONF"
    );
    for row in rows {
        let Some(intel) = &row.intel else {
            println!(
                "{:<20} {}",
                row.match_id,
                row.message.unwrap_or("insufficient data for this match")
            );
            continue;
        };
        let model = intel.model_probability.get(intel.selection);
        let fair = intel
            .market_probability_fair
            .and_then(|f| f.get(intel.selection));
        let show = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v));
        println!(
            "{:<20} {:<6} {:>8} {:>8} {:>8} {:>8} {:<8}",
            row.match_id,
            intel.selection.as_str(),
            show(model),
            show(fair),
            show(intel.edge_value),
            intel.edge_bucket.as_str(),
            format!("{:?}", intel.confidence).to_lowercase(),
        );
    }
}
