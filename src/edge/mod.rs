//! Edge classification module
//!
//! Compares model and fair market probabilities and buckets the gap

mod classifier;
mod types;

pub use classifier::EdgeClassifier;
pub use types::{EdgeAssessment, EdgeBucket, EdgeThresholds};
