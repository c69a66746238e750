//! Analysis pipeline module
//!
//! Wires normalization, de-vig, blending and edge classification together

mod analyzer;
mod types;

pub use analyzer::Analyzer;
pub use types::{
    Analysis, AnalysisError, AnalysisSnapshot, BatchItem, MarketIntel, SNAPSHOT_SCHEMA_VERSION,
};
