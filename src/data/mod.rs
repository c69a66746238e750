//! Data export module
//!
//! Writes ledger entries to Parquet for analytics

mod parquet;

pub use parquet::{ledger_schema, ExportedPrediction, LedgerParquetReader, LedgerParquetWriter};
