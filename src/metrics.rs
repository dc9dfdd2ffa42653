//! Prometheus metrics for request latency and todo operations.
//!
//! This module provides metrics for:
//! - `/todo` request latency and outcome, labelled by method
//! - Records created, updated and deleted
//! - Storage failures

use std::time::Instant;

use axum::http::Method;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Request latency metric name.
pub const METRIC_REQUEST_LATENCY: &str = "todo_request_latency_ms";
/// Requests counter metric name.
pub const METRIC_REQUESTS: &str = "todo_requests_total";
/// Todos created counter metric name.
pub const METRIC_TODOS_CREATED: &str = "todos_created_total";
/// Todos updated counter metric name.
pub const METRIC_TODOS_UPDATED: &str = "todos_updated_total";
/// Todos deleted counter metric name.
pub const METRIC_TODOS_DELETED: &str = "todos_deleted_total";
/// Storage failures counter metric name.
pub const METRIC_STORAGE_ERRORS: &str = "storage_errors_total";

/// Install the global Prometheus recorder and describe all metrics.
/// Call this once at startup.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Register metric descriptions with the installed recorder.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_REQUEST_LATENCY,
        "Latency of /todo requests in milliseconds"
    );

    describe_counter!(METRIC_REQUESTS, "Total /todo requests by method and status");
    describe_counter!(METRIC_TODOS_CREATED, "Total number of todos created");
    describe_counter!(METRIC_TODOS_UPDATED, "Total number of todos updated");
    describe_counter!(METRIC_TODOS_DELETED, "Total number of todos deleted");
    describe_counter!(
        METRIC_STORAGE_ERRORS,
        "Total number of storage operations that failed"
    );

    debug!("Metrics initialized");
}

/// Label value for a request method.
///
/// Only the methods `/todo` serves get their own series; anything else a
/// client sends collapses into `OTHER` so label cardinality stays fixed.
pub fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        _ => "OTHER",
    }
}

/// Count a finished `/todo` request.
pub fn record_request(method: &Method, status: u16) {
    counter!(
        METRIC_REQUESTS,
        "method" => method_label(method),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Increment todos created counter.
pub fn inc_todos_created() {
    counter!(METRIC_TODOS_CREATED).increment(1);
}

/// Increment todos updated counter.
pub fn inc_todos_updated() {
    counter!(METRIC_TODOS_UPDATED).increment(1);
}

/// Increment todos deleted counter.
pub fn inc_todos_deleted() {
    counter!(METRIC_TODOS_DELETED).increment(1);
}

/// Increment storage errors counter.
pub fn inc_storage_errors() {
    counter!(METRIC_STORAGE_ERRORS).increment(1);
}

/// RAII guard for timing requests.
/// Records latency, labelled by method, when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
    method: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric and method.
    pub fn new(metric_name: &'static str, method: &Method) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
            method: method_label(method),
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name, "method" => self.method).record(self.elapsed_ms());
    }
}

/// Create a latency timer for a `/todo` request.
pub fn timer_request(method: &Method) -> LatencyTimer {
    LatencyTimer::new(METRIC_REQUEST_LATENCY, method)
}
