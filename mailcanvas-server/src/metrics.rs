//! Prometheus metrics for mailcanvas-server.
//!
//! Provides metrics collection and a Prometheus-compatible `/metrics` endpoint.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// Metric names as constants for consistency
const HTTP_REQUESTS_TOTAL: &str = "mailcanvas_http_requests_total";
const HTTP_REQUEST_DURATION: &str = "mailcanvas_http_request_duration_seconds";
const TEMPLATES_STORED: &str = "mailcanvas_templates_stored";
const TEMPLATES_SAVED_TOTAL: &str = "mailcanvas_templates_saved_total";
const TEMPLATES_DELETED_TOTAL: &str = "mailcanvas_templates_deleted_total";
const RENDERS_TOTAL: &str = "mailcanvas_renders_total";
const IMPORTS_TOTAL: &str = "mailcanvas_imports_total";
const DESIGN_GENERATIONS_TOTAL: &str = "mailcanvas_design_generations_total";
const SHORTCODE_LOOKUPS_TOTAL: &str = "mailcanvas_shortcode_lookups_total";
const VALIDATION_FAILURES_TOTAL: &str = "mailcanvas_validation_failures_total";

/// Initialize metrics and return the Prometheus handle.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed
/// (e.g., if another recorder is already installed).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record an HTTP request.
///
/// # Arguments
///
/// * `method` - HTTP method (GET, POST, etc.)
/// * `path` - Matched route pattern
/// * `status` - HTTP status code
/// * `duration_secs` - Request duration in seconds
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        HTTP_REQUEST_DURATION,
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

/// Middleware that records every request against its route pattern.
pub async fn track_http(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());

    let response = next.run(request).await;
    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}

/// Update the stored template count.
#[allow(clippy::cast_precision_loss)]
pub fn set_templates_stored(count: usize) {
    gauge!(TEMPLATES_STORED).set(count as f64);
}

/// Record a saved template.
///
/// # Arguments
///
/// * `operation` - "insert", "update" or "save_as"
pub fn record_template_saved(operation: &str) {
    counter!(TEMPLATES_SAVED_TOTAL, "operation" => operation.to_string()).increment(1);
}

/// Record a deleted template.
pub fn record_template_deleted() {
    counter!(TEMPLATES_DELETED_TOTAL).increment(1);
}

/// Record an HTML render.
///
/// # Arguments
///
/// * `mode` - Layout mode ("absolute" or "table")
pub fn record_render(mode: &str) {
    counter!(RENDERS_TOTAL, "mode" => mode.to_string()).increment(1);
}

/// Record an HTML import.
///
/// # Arguments
///
/// * `outcome` - "found" or "empty"
pub fn record_import(outcome: &str) {
    counter!(IMPORTS_TOTAL, "outcome" => outcome.to_string()).increment(1);
}

/// Record an AI design generation.
///
/// # Arguments
///
/// * `outcome` - "success", "busy", "unavailable" or "error"
pub fn record_design_generation(outcome: &str) {
    counter!(DESIGN_GENERATIONS_TOTAL, "outcome" => outcome.to_string()).increment(1);
}

/// Record a retrieval by shortcode.
pub fn record_shortcode_lookup(found: bool) {
    counter!(SHORTCODE_LOOKUPS_TOTAL, "found" => found.to_string()).increment(1);
}

/// Record an input validation failure.
///
/// # Arguments
///
/// * `validation_type` - Type of validation that failed (name, shortcode, html, etc.)
pub fn record_validation_failure(validation_type: &str) {
    counter!(
        VALIDATION_FAILURES_TOTAL,
        "type" => validation_type.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Without an installed recorder these are no-ops; they must not panic.
    #[test]
    fn test_recording_without_recorder() {
        record_http_request("GET", "/api/templates", 200, 0.01);
        set_templates_stored(3);
        record_template_saved("insert");
        record_template_deleted();
        record_render("table");
        record_import("empty");
        record_design_generation("busy");
        record_shortcode_lookup(false);
        record_validation_failure("name");
    }
}
