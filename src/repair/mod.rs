//! Integrity repair of stored predictions

mod integrity;
mod types;

pub use integrity::{snapshots_from_entries, snapshots_from_list, IntegrityRepair, SnapshotIndex};
pub use types::{IssueKind, IssueStatus, RepairIssue, RepairReport, UnrepairableReason};
