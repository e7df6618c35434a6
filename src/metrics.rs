/// Metrics and telemetry for the KlikJasa verification console
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - Record source fetches and their latency
/// - Change-feed notifications and console refreshes
/// - Submissions and review actions
/// - Background job execution

use crate::error::{KlikError, KlikResult};
use lazy_static::lazy_static;
use prometheus::{
    register_gauge, register_histogram_vec, register_int_counter_vec, Encoder, Gauge,
    HistogramVec, IntCounterVec, TextEncoder,
};

lazy_static! {
    // ========== Record Source Metrics ==========

    /// Snapshot fetches by trigger and outcome
    pub static ref SOURCE_FETCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "verification_source_fetches_total",
        "Total number of verification snapshot fetches",
        &["trigger", "outcome"]
    )
    .unwrap();

    /// Snapshot fetch duration in seconds
    pub static ref SOURCE_FETCH_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "verification_source_fetch_duration_seconds",
        "Verification snapshot fetch latencies in seconds",
        &["trigger"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .unwrap();

    // ========== Change Feed Metrics ==========

    /// Change notifications published by kind
    pub static ref CHANGE_EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "verification_change_events_total",
        "Total number of verification change notifications",
        &["kind"]
    )
    .unwrap();

    /// Notifications folded into an already-scheduled refresh
    pub static ref CHANGE_EVENTS_COLLAPSED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "verification_change_events_collapsed_total",
        "Change notifications collapsed into a pending refresh",
        &["listener"]
    )
    .unwrap();

    // ========== Review Metrics ==========

    /// Submissions and reviews by action
    pub static ref REVIEW_ACTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "verification_review_actions_total",
        "Total number of verification submissions and reviews",
        &["action"]
    )
    .unwrap();

    // ========== Background Job Metrics ==========

    /// Background job executions by job type and status
    pub static ref BACKGROUND_JOBS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "background_jobs_total",
        "Total number of background job executions",
        &["job_type", "status"]
    )
    .unwrap();

    // ========== System Metrics ==========

    /// Application uptime in seconds
    pub static ref UPTIME_SECONDS: Gauge = register_gauge!(
        "uptime_seconds",
        "Application uptime in seconds"
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> KlikResult<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| KlikError::Internal(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| KlikError::Internal(format!("Metrics are not UTF-8: {}", e)))
}

/// Record a snapshot fetch
pub fn record_fetch(trigger: &str, success: bool, duration: f64) {
    let outcome = if success { "success" } else { "failure" };
    SOURCE_FETCHES_TOTAL
        .with_label_values(&[trigger, outcome])
        .inc();
    SOURCE_FETCH_DURATION_SECONDS
        .with_label_values(&[trigger])
        .observe(duration);
}

/// Record a published change notification
pub fn record_change_event(kind: &str) {
    CHANGE_EVENTS_TOTAL.with_label_values(&[kind]).inc();
}

/// Record notifications collapsed into one refresh
pub fn record_collapsed_events(listener: &str, count: usize) {
    CHANGE_EVENTS_COLLAPSED_TOTAL
        .with_label_values(&[listener])
        .inc_by(count as u64);
}

/// Record a submission or review
pub fn record_review_action(action: &str) {
    REVIEW_ACTIONS_TOTAL.with_label_values(&[action]).inc();
}

/// Record a background job execution
pub fn record_background_job(job_type: &str, status: &str) {
    BACKGROUND_JOBS_TOTAL
        .with_label_values(&[job_type, status])
        .inc();
}
