//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by pillar, method, status
//! - `gateway_request_duration_seconds` (histogram): latency by pillar, method
//! - `gateway_errors_total` (counter): failures by error code
//! - `gateway_ws_connections` (gauge): open WebSocket sessions
//!
//! # Design Decisions
//! - Macros are no-ops until a recorder is installed, so tests and
//!   metrics-disabled deployments pay nothing
//! - Prometheus exporter serves its own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one routed request.
pub fn record_request(pillar: &str, method: &str, status: u16, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();

    counter!(
        "gateway_requests_total",
        "pillar" => pillar.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        "gateway_request_duration_seconds",
        "pillar" => pillar.to_string(),
        "method" => method.to_string()
    )
    .record(elapsed);
}

pub fn record_error(code: &str) {
    counter!("gateway_errors_total", "code" => code.to_string()).increment(1);
}

pub fn ws_connection_opened() {
    gauge!("gateway_ws_connections").increment(1.0);
}

pub fn ws_connection_closed() {
    gauge!("gateway_ws_connections").decrement(1.0);
}
