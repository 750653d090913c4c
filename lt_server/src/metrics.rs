//! Prometheus metrics for the tournament server.
//!
//! Metrics are recorded through the `metrics` facade. They are only exported
//! when [`init_metrics`] installed the Prometheus listener; otherwise the
//! recording calls are no-ops.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use lt_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/api/team", 201);
//! ```

use lol_tournament::winner::CoinSide;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Increments the total HTTP request counter with method, path, and status labels.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

/// Count error responses by status code.
pub fn api_errors_total(status: u16) {
    metrics::counter!("api_errors_total",
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Tournament Metrics
// ============================================================================

/// Count created matches by the side the coin picked.
pub fn matches_created_total(side: CoinSide) {
    metrics::counter!("matches_created_total",
        "side" => side.as_str()
    )
    .increment(1);
}
