//! Signal normalization module
//!
//! Turns raw, sport-specific feed input into a uniform signal bundle

mod normalizer;
mod raw;
mod types;

pub use normalizer::{normalize, normalize_resolved, TeamResolver};
pub use raw::{RawInjury, RawMatchInput, RawMeeting, RawTeamStats};
pub use types::{
    DataAvailability, FormResult, H2hResult, Injury, InjurySeverity, Outcome, OutcomeSpace,
    PerSide, RestContext, SeasonStats, SignalError, Sport, TeamForm, TeamId, TeamSide,
    UniversalSignals,
};
