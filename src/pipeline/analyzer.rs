//! Per-match analysis
//!
//! normalize -> de-vig -> blend -> classify. Every stage is pure, so matches
//! are analyzed independently and in parallel.

use super::types::{Analysis, AnalysisError, AnalysisSnapshot, BatchItem, MarketIntel, SNAPSHOT_SCHEMA_VERSION};
use crate::config::Config;
use crate::edge::{EdgeBucket, EdgeClassifier};
use crate::market::devig;
use crate::model::{Blender, ProbabilityModel};
use crate::signal::{normalize, normalize_resolved, RawMatchInput, TeamResolver};
use crate::telemetry::{increment_counter, record_edge, CounterMetric};
use rayon::prelude::*;
use std::time::Duration;

/// Runs the analysis pipeline for one model version
pub struct Analyzer<M: ProbabilityModel = Blender> {
    model: M,
    classifier: EdgeClassifier,
    resolver: Option<TeamResolver>,
    model_version: String,
}

impl Analyzer<Blender> {
    /// Build the standard blender pipeline from configuration
    pub fn from_config(config: &Config) -> Self {
        let resolver = TeamResolver::new(
            &config.teams.aliases,
            config.teams.cache_capacity,
            Duration::from_secs(config.teams.cache_ttl_secs),
        );
        Self::new(
            Blender::new(config.blend.clone()),
            EdgeClassifier::new(config.edge.clone(), config.blend.tie_tolerance),
            config.model.version.clone(),
        )
        .with_resolver(resolver)
    }
}

impl<M: ProbabilityModel> Analyzer<M> {
    /// Create a new analyzer
    pub fn new(model: M, classifier: EdgeClassifier, model_version: impl Into<String>) -> Self {
        Self {
            model,
            classifier,
            resolver: None,
            model_version: model_version.into(),
        }
    }

    /// Resolve team identifiers through an alias table and cache
    pub fn with_resolver(mut self, resolver: TeamResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    /// Analyze one match
    pub fn analyze(&self, raw: &RawMatchInput) -> Result<Analysis, AnalysisError> {
        match self.run(raw) {
            Ok(analysis) => {
                increment_counter(CounterMetric::Analysis, "ok");
                if let Some(edge) = analysis.intel.edge_value {
                    record_edge(edge);
                }
                Ok(analysis)
            }
            Err(e) => {
                increment_counter(CounterMetric::Analysis, e.reason_code());
                tracing::warn!(match_id = %raw.match_id, reason = e.reason_code(), error = %e, "Analysis failed");
                Err(e)
            }
        }
    }

    /// Analyze many matches; a failure never stops the rest of the batch
    pub fn analyze_batch(&self, inputs: &[RawMatchInput]) -> Vec<BatchItem> {
        let items: Vec<BatchItem> = inputs
            .par_iter()
            .map(|raw| BatchItem {
                match_id: raw.match_id.clone(),
                result: self.analyze(raw),
            })
            .collect();

        let failed = items.iter().filter(|i| i.result.is_err()).count();
        tracing::info!(
            total = items.len(),
            failed,
            model_version = %self.model_version,
            "Batch analysis complete"
        );
        items
    }

    fn run(&self, raw: &RawMatchInput) -> Result<Analysis, AnalysisError> {
        let mut signals = match &self.resolver {
            Some(resolver) => normalize_resolved(raw, resolver)?,
            None => normalize(raw)?,
        };

        let pricing = match signals.market_odds.as_ref().map(devig) {
            Some(Ok(pricing)) => Some(pricing),
            Some(Err(e)) => {
                tracing::warn!(match_id = %signals.match_id, error = %e, "Market unavailable, using features only");
                signals.availability.market_odds = false;
                None
            }
            None => None,
        };

        let blend = self.model.estimate(&signals, pricing.as_ref())?;
        let model = blend.probability;
        let fair = pricing.as_ref().map(|p| &p.fair);

        let assessment = fair.and_then(|fair| self.classifier.assess(&model, fair));
        let selection = match assessment {
            Some(a) => a.selection,
            None => model.favorite(fair, self.classifier.tie_tolerance()),
        };

        let intel = MarketIntel {
            match_id: signals.match_id.clone(),
            sport: signals.sport,
            model_probability: model,
            market_probability_raw: pricing.as_ref().map(|p| p.raw),
            market_probability_fair: pricing.as_ref().map(|p| p.fair),
            edge_value: assessment.map(|a| a.edge_value),
            edge_bucket: assessment.map_or(EdgeBucket::NoEdge, |a| a.bucket),
            selection,
            confidence: model.confidence,
        };

        tracing::info!(
            match_id = %intel.match_id,
            selection = %intel.selection,
            edge = ?intel.edge_value,
            bucket = %intel.edge_bucket,
            confidence = ?intel.confidence,
            "Match analyzed"
        );

        let snapshot = AnalysisSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            model_version: self.model_version.clone(),
            odds: signals.market_odds.clone(),
            signals,
            adjustments: blend.adjustments,
            intel: intel.clone(),
        };

        Ok(Analysis { intel, snapshot })
    }
}
