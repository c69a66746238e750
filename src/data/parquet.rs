//! Parquet export of ledger entries

use crate::ledger::PredictionLedgerEntry;
use crate::signal::Outcome;
use arrow::array::{Array, ArrayRef, Float64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rust_decimal::Decimal;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

fn timestamp_field(name: &str, nullable: bool) -> Field {
    Field::new(
        name,
        DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
        nullable,
    )
}

/// Ledger entry schema; decimals are stored as strings for precision
pub fn ledger_schema() -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("match_id", DataType::Utf8, false),
        Field::new("model_version", DataType::Utf8, false),
        Field::new("sport", DataType::Utf8, false),
        Field::new("selection", DataType::Utf8, false),
        Field::new("model_home", DataType::Float64, false),
        Field::new("model_draw", DataType::Float64, true),
        Field::new("model_away", DataType::Float64, false),
        Field::new("fair_home", DataType::Float64, true),
        Field::new("fair_draw", DataType::Float64, true),
        Field::new("fair_away", DataType::Float64, true),
        Field::new("edge_value", DataType::Float64, true),
        Field::new("edge_bucket", DataType::Utf8, false),
        timestamp_field("prediction_timestamp", false),
        timestamp_field("kickoff", false),
        Field::new("opening_odds", DataType::Utf8, true),
        Field::new("closing_odds", DataType::Utf8, true),
        Field::new("clv_value", DataType::Float64, true),
        Field::new("actual_score", DataType::Utf8, true),
        Field::new("outcome", DataType::Utf8, false),
        timestamp_field("settled_at", true),
    ])
}

fn strings<'a>(values: impl Iterator<Item = &'a str>) -> ArrayRef {
    Arc::new(StringArray::from(values.collect::<Vec<_>>()))
}

fn optional_strings(values: impl Iterator<Item = Option<String>>) -> ArrayRef {
    Arc::new(StringArray::from(values.collect::<Vec<_>>()))
}

fn floats(values: impl Iterator<Item = Option<f64>>) -> ArrayRef {
    Arc::new(Float64Array::from(values.collect::<Vec<_>>()))
}

fn timestamps(values: impl Iterator<Item = Option<DateTime<Utc>>>) -> ArrayRef {
    let micros: Vec<Option<i64>> = values.map(|t| t.map(|t| t.timestamp_micros())).collect();
    Arc::new(TimestampMicrosecondArray::from(micros).with_timezone("UTC"))
}

/// Writes ledger entries to Parquet files
pub struct LedgerParquetWriter {
    output_dir: PathBuf,
}

impl LedgerParquetWriter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Ensure output directory exists
    pub fn ensure_dir(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// File path for an export taken at `timestamp`
    pub fn file_path(&self, prefix: &str, timestamp: DateTime<Utc>) -> PathBuf {
        let filename = format!("{}_{}.parquet", prefix, timestamp.format("%Y%m%d_%H%M%S"));
        self.output_dir.join(filename)
    }

    /// Write entries to `path`; nothing is written for an empty slice
    pub fn write_entries(
        &self,
        path: &Path,
        entries: &[PredictionLedgerEntry],
    ) -> anyhow::Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        self.ensure_dir()?;

        let schema = Arc::new(ledger_schema());
        let file = File::create(path)?;

        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        let ids: Vec<String> = entries.iter().map(|e| e.id.to_string()).collect();
        let fair = |outcome: Outcome| {
            entries
                .iter()
                .map(move |e| e.market_probability_fair.and_then(|f| f.get(outcome)))
        };

        let columns: Vec<ArrayRef> = vec![
            strings(ids.iter().map(String::as_str)),
            strings(entries.iter().map(|e| e.match_id.as_str())),
            strings(entries.iter().map(|e| e.model_version.as_str())),
            strings(entries.iter().map(|e| e.sport.as_str())),
            strings(entries.iter().map(|e| e.selection.as_str())),
            floats(entries.iter().map(|e| Some(e.model_probability.home))),
            floats(entries.iter().map(|e| e.model_probability.draw)),
            floats(entries.iter().map(|e| Some(e.model_probability.away))),
            floats(fair(Outcome::Home)),
            floats(fair(Outcome::Draw)),
            floats(fair(Outcome::Away)),
            floats(entries.iter().map(|e| e.edge_value)),
            strings(entries.iter().map(|e| e.edge_bucket.as_str())),
            timestamps(entries.iter().map(|e| Some(e.prediction_timestamp))),
            timestamps(entries.iter().map(|e| Some(e.kickoff))),
            optional_strings(entries.iter().map(|e| e.opening_odds.map(|d| d.to_string()))),
            optional_strings(entries.iter().map(|e| e.closing_odds.map(|d| d.to_string()))),
            floats(entries.iter().map(|e| e.clv_value)),
            optional_strings(entries.iter().map(|e| e.actual_score.map(|s| s.to_string()))),
            strings(entries.iter().map(|e| e.outcome.as_str())),
            timestamps(entries.iter().map(|e| e.settled_at)),
        ];

        let batch = RecordBatch::try_new(schema, columns)?;

        writer.write(&batch)?;
        writer.close()?;

        tracing::debug!(path = ?path, count = entries.len(), "Wrote ledger entries to Parquet");

        Ok(())
    }
}

/// Subset of an exported row read back for verification and analytics
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedPrediction {
    pub match_id: String,
    pub selection: String,
    pub edge_value: Option<f64>,
    pub edge_bucket: String,
    pub kickoff: DateTime<Utc>,
    pub closing_odds: Option<Decimal>,
    pub outcome: String,
}

/// Reader for exported ledger files
pub struct LedgerParquetReader {
    path: PathBuf,
}

impl LedgerParquetReader {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn read(&self) -> anyhow::Result<Vec<ExportedPrediction>> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(&self.path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let reader = builder.build()?;

        let mut rows = Vec::new();

        for batch_result in reader {
            let batch = batch_result?;

            let string_column = |name: &str| {
                batch
                    .column_by_name(name)
                    .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                    .ok_or_else(|| anyhow::anyhow!("Invalid {} column", name))
            };
            let match_ids = string_column("match_id")?;
            let selections = string_column("selection")?;
            let buckets = string_column("edge_bucket")?;
            let closing = string_column("closing_odds")?;
            let outcomes = string_column("outcome")?;

            let edges = batch
                .column_by_name("edge_value")
                .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
                .ok_or_else(|| anyhow::anyhow!("Invalid edge_value column"))?;
            let kickoffs = batch
                .column_by_name("kickoff")
                .and_then(|c| c.as_any().downcast_ref::<TimestampMicrosecondArray>())
                .ok_or_else(|| anyhow::anyhow!("Invalid kickoff column"))?;

            for i in 0..batch.num_rows() {
                let kickoff = DateTime::from_timestamp_micros(kickoffs.value(i))
                    .ok_or_else(|| anyhow::anyhow!("Invalid kickoff"))?;
                let closing_odds = if closing.is_null(i) {
                    None
                } else {
                    Some(Decimal::from_str(closing.value(i))?)
                };

                rows.push(ExportedPrediction {
                    match_id: match_ids.value(i).to_string(),
                    selection: selections.value(i).to_string(),
                    edge_value: (!edges.is_null(i)).then(|| edges.value(i)),
                    edge_bucket: buckets.value(i).to_string(),
                    kickoff,
                    closing_odds,
                    outcome: outcomes.value(i).to_string(),
                });
            }
        }

        Ok(rows)
    }

    /// Get the file path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}
