//! Integrity repair types

use crate::ledger::{FieldChange, LedgerId};
use serde::Serialize;
use std::fmt;

/// An internal-consistency violation found on a ledger entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    /// Model probabilities sum outside the plausible band
    ProbabilitySum { sum: f64 },
    /// Any model probability below zero
    NegativeProbability,
    /// Fair market probabilities do not sum to 100
    MarketSum { sum: f64 },
    /// Stored edge disagrees with model minus fair market for the selection
    EdgeDrift {
        stored: Option<f64>,
        expected: Option<f64>,
    },
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::ProbabilitySum { sum } => write!(f, "probability sum {:.2}", sum),
            IssueKind::NegativeProbability => f.write_str("negative probability"),
            IssueKind::MarketSum { sum } => write!(f, "fair market sum {:.2}", sum),
            IssueKind::EdgeDrift { stored, expected } => {
                write!(f, "edge drift {:?} vs {:?}", stored, expected)
            }
        }
    }
}

/// Why a flagged entry was left as is
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnrepairableReason {
    /// No authoritative snapshot for this entry
    NoSnapshot,
    /// Snapshot schema this build cannot read
    UnsupportedSchema(u32),
    /// Snapshot belongs to another match, model version or selection
    SnapshotMismatch,
    /// Snapshot fails the same checks, or repairing from it would
    SnapshotCorrupt,
    /// Entry was re-recorded between scan and write; the next pass sees it
    EntryChanged,
}

impl UnrepairableReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnrepairableReason::NoSnapshot => "no_snapshot",
            UnrepairableReason::UnsupportedSchema(_) => "unsupported_schema",
            UnrepairableReason::SnapshotMismatch => "snapshot_mismatch",
            UnrepairableReason::SnapshotCorrupt => "snapshot_corrupt",
            UnrepairableReason::EntryChanged => "entry_changed",
        }
    }
}

/// What happened to a flagged entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IssueStatus {
    Fixed { changes: Vec<FieldChange> },
    Unrepairable { reason: UnrepairableReason },
}

/// One flagged entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairIssue {
    pub ledger_id: LedgerId,
    pub match_id: String,
    pub kinds: Vec<IssueKind>,
    pub status: IssueStatus,
}

/// Result of a repair pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepairReport {
    pub scanned: usize,
    pub fixed_count: usize,
    pub issues: Vec<RepairIssue>,
}

impl RepairReport {
    pub fn unrepairable_count(&self) -> usize {
        self.issues.len() - self.fixed_count
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}
