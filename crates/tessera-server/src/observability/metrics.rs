//! Prometheus Metrics
//!
//! Metrics tracked:
//! - `tessera_probe_total` - counter of device requests by operation and outcome
//! - `tessera_probe_duration_seconds` - histogram of device request latency
//! - `tessera_devices_discovered` - gauge of devices in the latest registry
//! - `tessera_islands` - gauge of islands in the latest topology
//! - `tessera_claimed_modules` - gauge of addresses in the latest routing index
//! - `tessera_formation_runs_total` - counter of completed formation runs
//! - `tessera_route_fallback_total` - counter of routes resolved to the default endpoint
//! - `tessera_commands_total` - counter of per-module commands by outcome

use crate::network::formation::Topology;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// State containing the Prometheus handle for metrics export
#[derive(Clone)]
pub struct MetricsState {
    pub prometheus_handle: PrometheusHandle,
}

/// Install the Prometheus recorder and register metric descriptions
pub fn init_metrics() -> Result<MetricsState, Box<dyn std::error::Error + Send + Sync>> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    register_metric_descriptions();

    Ok(MetricsState {
        prometheus_handle: handle,
    })
}

fn register_metric_descriptions() {
    describe_counter!(
        "tessera_probe_total",
        "Total device requests by operation and outcome"
    );
    describe_histogram!(
        "tessera_probe_duration_seconds",
        "Duration of device requests in seconds"
    );

    describe_gauge!(
        "tessera_devices_discovered",
        "Devices in the most recent registry"
    );
    describe_gauge!("tessera_islands", "Islands in the most recent topology");
    describe_gauge!(
        "tessera_claimed_modules",
        "Module addresses in the most recent routing index"
    );
    describe_counter!(
        "tessera_formation_runs_total",
        "Total completed formation runs"
    );

    describe_counter!(
        "tessera_route_fallback_total",
        "Total routes resolved to the default endpoint"
    );
    describe_counter!(
        "tessera_commands_total",
        "Total per-module commands by outcome"
    );
}

/// Record one settled device request
pub fn record_probe(operation: &str, outcome: &str, duration: Duration) {
    counter!(
        "tessera_probe_total",
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!(
        "tessera_probe_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

pub fn set_devices_discovered(count: usize) {
    gauge!("tessera_devices_discovered").set(count as f64);
}

/// Record a completed formation run
pub fn record_formation(topology: &Topology) {
    counter!("tessera_formation_runs_total").increment(1);
    gauge!("tessera_islands").set(topology.islands.len() as f64);
    gauge!("tessera_claimed_modules").set(topology.index.len() as f64);
}

pub fn record_route_fallback() {
    counter!("tessera_route_fallback_total").increment(1);
}

pub fn record_command(outcome: &str) {
    counter!("tessera_commands_total", "outcome" => outcome.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::GridConfig;

    #[test]
    fn test_metric_recording() {
        // These functions should not panic without an installed recorder
        record_probe("get_id", "ok", Duration::from_millis(12));
        record_probe("get_grid", "timeout", Duration::from_secs(2));
        set_devices_discovered(4);
        record_formation(&Topology::empty(&GridConfig::default()));
        record_route_fallback();
        record_command("ok");
    }
}
