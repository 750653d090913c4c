//! Structured logging configuration.
//!
//! `tracing-subscriber` also picks up records from the `log` facade, so the
//! library crate's `log::info!` calls end up in the same output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from `RUST_LOG`, defaulting to `info` with quieter
/// `sqlx` and `hyper`.
///
/// # Example
///
/// ```no_run
/// use lt_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a completed API request
pub fn log_api_request(method: &str, path: &str, status_code: u16, duration_ms: u64) {
    if status_code >= 500 {
        tracing::error!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "API request failed"
        );
    } else {
        tracing::info!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "API request completed"
        );
    }
}

/// Log a service error turned into an HTTP error response.
///
/// 5xx errors are logged at `error` with the full source, the rest at `debug`.
pub fn log_service_error(status_code: u16, error: &dyn std::error::Error) {
    if status_code >= 500 {
        tracing::error!(http_status = status_code, error = %error, "Request failed");
    } else {
        tracing::debug!(http_status = status_code, error = %error, "Request rejected");
    }
}
