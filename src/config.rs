//! Configuration types for sports-edge

use crate::edge::EdgeThresholds;
use crate::model::BlendWeights;
use crate::telemetry::LogFormat;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub blend: BlendWeights,
    #[serde(default)]
    pub edge: EdgeThresholds,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub repair: RepairConfig,
    #[serde(default)]
    pub teams: TeamsConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Model identification
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Version tag stored on every ledger entry
    #[serde(default = "default_model_version")]
    pub version: String,
}

fn default_model_version() -> String {
    "v1".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            version: default_model_version(),
        }
    }
}

/// Prediction ledger configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// JSON file the CLI persists the ledger to
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,

    /// Snapshots this close to kickoff count as closing odds (minutes)
    #[serde(default = "default_closing_window")]
    pub closing_window_minutes: i64,
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("ledger.json")
}
fn default_closing_window() -> i64 {
    30
}

impl LedgerConfig {
    pub fn closing_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.closing_window_minutes)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
            closing_window_minutes: 30,
        }
    }
}

/// Integrity repair bounds
#[derive(Debug, Clone, Deserialize)]
pub struct RepairConfig {
    /// Smallest plausible probability sum (percent)
    #[serde(default = "default_sum_min")]
    pub sum_min: f64,

    /// Largest plausible probability sum (percent)
    #[serde(default = "default_sum_max")]
    pub sum_max: f64,

    /// Allowed drift between stored and recomputed edge (points)
    #[serde(default = "default_edge_tolerance")]
    pub edge_tolerance: f64,
}

fn default_sum_min() -> f64 {
    98.0
}
fn default_sum_max() -> f64 {
    112.0
}
fn default_edge_tolerance() -> f64 {
    0.05
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            sum_min: 98.0,
            sum_max: 112.0,
            edge_tolerance: 0.05,
        }
    }
}

/// Team identifier resolution
#[derive(Debug, Clone, Deserialize)]
pub struct TeamsConfig {
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Alias -> canonical team name
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

fn default_cache_capacity() -> usize {
    512
}
fn default_cache_ttl() -> u64 {
    3600
}

impl Default for TeamsConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 512,
            cache_ttl_secs: 3600,
            aliases: HashMap::new(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Serve Prometheus metrics on this port when set
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject internally inconsistent settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.edge.is_valid() {
            anyhow::bail!(
                "edge thresholds must be positive and strictly increasing: {} / {} / {}",
                self.edge.small,
                self.edge.medium,
                self.edge.high
            );
        }
        if self.repair.sum_min >= self.repair.sum_max {
            anyhow::bail!(
                "repair.sum_min ({}) must be below repair.sum_max ({})",
                self.repair.sum_min,
                self.repair.sum_max
            );
        }
        if self.ledger.closing_window_minutes <= 0 {
            anyhow::bail!("ledger.closing_window_minutes must be positive");
        }
        if self.model.version.trim().is_empty() {
            anyhow::bail!("model.version must not be empty");
        }
        Ok(())
    }
}
