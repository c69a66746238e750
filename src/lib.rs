//! sports-edge: edge ranking and prediction tracking for sports matches
//!
//! This library provides the core components for:
//! - Normalizing raw per-sport match data into a uniform signal bundle
//! - Removing bookmaker margin from decimal odds
//! - Blending signals with the market prior into outcome probabilities
//! - Classifying the model's edge against the fair market
//! - A prediction ledger with an enforced settlement lifecycle
//! - Outcome settlement, closing line value and performance summaries
//! - Integrity repair of stored predictions from analysis snapshots
//! - Parquet export and a full observability stack

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod edge;
pub mod ledger;
pub mod market;
pub mod model;
pub mod pipeline;
pub mod repair;
pub mod signal;
pub mod telemetry;
pub mod tracker;
