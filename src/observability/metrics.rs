//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pooled_http_transport_initialized_total` (counter)
//! - `pooled_http_transport_closed_total` (counter)
//! - `pooled_http_transport_init_failures_total` (counter)
//! - `pooled_http_live_handles` (gauge): handles currently holding the transport
//! - `pooled_http_leases_active` (gauge): pool leases in use
//! - `pooled_http_requests_total` (counter): by method, status
//! - `pooled_http_request_duration_seconds` (histogram): by method
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_transport_initialized() {
    metrics::counter!("pooled_http_transport_initialized_total").increment(1);
}

pub fn record_transport_closed() {
    metrics::counter!("pooled_http_transport_closed_total").increment(1);
}

pub fn record_init_failure() {
    metrics::counter!("pooled_http_transport_init_failures_total").increment(1);
}

pub fn set_live_handles(count: usize) {
    metrics::gauge!("pooled_http_live_handles").set(count as f64);
}

pub fn set_active_leases(count: usize) {
    metrics::gauge!("pooled_http_leases_active").set(count as f64);
}

/// Record one finished exchange. `status` is `None` for transport failures.
pub fn record_request(method: &str, status: Option<u16>, start: Instant) {
    let status = status.map_or_else(|| "error".to_string(), |s| s.to_string());
    metrics::counter!(
        "pooled_http_requests_total",
        "method" => method.to_string(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "pooled_http_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
