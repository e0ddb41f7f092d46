//! Metrics collection and exposition.
//!
//! # Metrics
//! - `enricher_exchanges_total` (counter): exchanges by method, status
//! - `enricher_exchange_duration_seconds` (histogram): latency distribution
//! - `enricher_factory_failures_total` (counter): enricher factory failures by policy
//! - `enricher_selflog_total` (counter): internal diagnostics reported

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed exchange.
pub fn record_exchange(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    ::metrics::counter!("enricher_exchanges_total", "method" => method.clone(), "status" => status.clone())
        .increment(1);
    ::metrics::histogram!("enricher_exchange_duration_seconds", "method" => method, "status" => status)
        .record(start.elapsed().as_secs_f64());
}

/// Record an enricher factory failure and the policy applied to it.
pub fn record_factory_failure(policy: &'static str) {
    ::metrics::counter!("enricher_factory_failures_total", "policy" => policy).increment(1);
}

pub fn record_selflog() {
    ::metrics::counter!("enricher_selflog_total").increment(1);
}
