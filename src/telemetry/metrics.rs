//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Match analyses, labelled by result or failure reason
    Analysis,
    /// Ledger writes, labelled by operation
    LedgerWrite,
    /// Settlements, labelled by outcome
    Settlement,
    /// Integrity repair results
    Repair,
}

impl CounterMetric {
    fn name_and_label(&self) -> (&'static str, &'static str) {
        match self {
            CounterMetric::Analysis => ("edge_analyses_total", "result"),
            CounterMetric::LedgerWrite => ("edge_ledger_writes_total", "op"),
            CounterMetric::Settlement => ("edge_settlements_total", "outcome"),
            CounterMetric::Repair => ("edge_repairs_total", "result"),
        }
    }
}

/// Increment a counter with its single label
pub fn increment_counter(metric: CounterMetric, value: &'static str) {
    let (name, label) = metric.name_and_label();
    metrics::counter!(name, label => value).increment(1);
}

/// Record the magnitude of an analyzed edge, in percentage points
pub fn record_edge(edge_value: f64) {
    metrics::histogram!("edge_abs_value_points").record(edge_value.abs());
}

/// Serve metrics over HTTP on `port`
pub fn install_exporter(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;
    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}
