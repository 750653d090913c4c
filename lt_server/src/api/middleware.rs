//! Request metrics middleware.
//!
//! Records `http_requests_total` and `http_request_duration_ms` for every
//! routed request, labelled with the route template (`/api/team/{id}`),
//! not the raw URI.
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::get, middleware};
//! use lt_server::api::middleware::track_metrics;
//! # async fn handler() {}
//!
//! let app: Router = Router::new()
//!     .route("/api/team", get(handler))
//!     .route_layer(middleware::from_fn(track_metrics));
//! # let _ = app;
//! ```

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};

use crate::{logging, metrics};

/// Time the request and record it under its matched route.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let status = response.status().as_u16();
    metrics::http_requests_total(&method, &path, status);
    metrics::http_request_duration_ms(&method, &path, elapsed.as_secs_f64() * 1000.0);
    logging::log_api_request(&method, &path, status, elapsed.as_millis() as u64);

    response
}
