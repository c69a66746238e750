//! Edge types

use crate::signal::Outcome;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence bucket for the size of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeBucket {
    NoEdge,
    Small,
    Medium,
    High,
}

impl EdgeBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeBucket::NoEdge => "NO_EDGE",
            EdgeBucket::Small => "SMALL",
            EdgeBucket::Medium => "MEDIUM",
            EdgeBucket::High => "HIGH",
        }
    }

    pub fn all() -> [EdgeBucket; 4] {
        [
            EdgeBucket::NoEdge,
            EdgeBucket::Small,
            EdgeBucket::Medium,
            EdgeBucket::High,
        ]
    }
}

impl fmt::Display for EdgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket thresholds in percentage points of `|edge|`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeThresholds {
    pub small: f64,
    pub medium: f64,
    pub high: f64,
}

impl Default for EdgeThresholds {
    fn default() -> Self {
        Self {
            small: 2.0,
            medium: 5.0,
            high: 8.0,
        }
    }
}

impl EdgeThresholds {
    /// Thresholds must be positive and strictly increasing
    pub fn is_valid(&self) -> bool {
        self.small > 0.0 && self.small < self.medium && self.medium < self.high
    }
}

/// Edge of one selection against the fair market
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeAssessment {
    pub selection: Outcome,
    /// Model minus fair market probability, in points
    pub edge_value: f64,
    pub bucket: EdgeBucket,
}
