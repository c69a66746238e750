//! Outcome and CLV tracker
//!
//! Settles ledger entries from reported results, measures closing line
//! value, and summarizes historical performance.

mod clv;
mod performance;
mod settlement;

pub use clv::closing_line_value;
pub use performance::{BucketRecord, PerformanceSummary};
pub use settlement::{
    resolve_report, resolve_score, DeferReason, OutcomeTracker, ResultReport, ResultStatus,
    Settlement,
};
