//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `cluster_secret_reconciliations_total` - Total number of reconcile cycles
//! - `cluster_secret_reconciliation_errors_total` - Failed cycles by error kind
//! - `cluster_secret_reconciliation_duration_seconds` - Duration of reconcile cycles
//! - `cluster_secret_secrets_created_total` - Secrets created in namespaces
//! - `cluster_secret_secrets_updated_total` - Secrets updated in place
//! - `cluster_secret_secrets_deleted_total` - Secrets removed from namespaces
//! - `cluster_secret_apply_errors_total` - Failed per-namespace writes by action
//! - `cluster_secret_synthesis_failures_total` - Desired secrets that could not be built
//! - `cluster_secret_status_update_retries_total` - Status writes retried after a conflict
//! - `cluster_secret_matching_namespaces` - Namespaces admitted per ClusterSecret

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, IntGaugeVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cluster_secret_reconciliations_total",
        "Total number of reconcile cycles",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "cluster_secret_reconciliation_errors_total",
            "Total number of failed reconcile cycles by error kind",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "cluster_secret_reconciliation_duration_seconds",
            "Duration of reconcile cycles in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static SECRETS_CREATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cluster_secret_secrets_created_total",
        "Total number of secrets created in selected namespaces",
    )
    .expect("Failed to create SECRETS_CREATED_TOTAL metric - this should never happen")
});

static SECRETS_UPDATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cluster_secret_secrets_updated_total",
        "Total number of secrets updated in place",
    )
    .expect("Failed to create SECRETS_UPDATED_TOTAL metric - this should never happen")
});

static SECRETS_DELETED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cluster_secret_secrets_deleted_total",
        "Total number of secrets removed from namespaces",
    )
    .expect("Failed to create SECRETS_DELETED_TOTAL metric - this should never happen")
});

static APPLY_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "cluster_secret_apply_errors_total",
            "Total number of failed secret writes by action",
        ),
        &["action"],
    )
    .expect("Failed to create APPLY_ERRORS_TOTAL metric - this should never happen")
});

static SYNTHESIS_FAILURES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cluster_secret_synthesis_failures_total",
        "Total number of desired secrets that could not be constructed",
    )
    .expect("Failed to create SYNTHESIS_FAILURES_TOTAL metric - this should never happen")
});

static STATUS_UPDATE_RETRIES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cluster_secret_status_update_retries_total",
        "Total number of status writes retried after a conflict",
    )
    .expect("Failed to create STATUS_UPDATE_RETRIES_TOTAL metric - this should never happen")
});

static MATCHING_NAMESPACES: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    IntGaugeVec::new(
        prometheus::Opts::new(
            "cluster_secret_matching_namespaces",
            "Namespaces admitted by the selector of each ClusterSecret",
        ),
        &["cluster_secret"],
    )
    .expect("Failed to create MATCHING_NAMESPACES metric - this should never happen")
});

/// Register all metrics with the global registry
///
/// # Errors
///
/// Fails when called twice.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(SECRETS_CREATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SECRETS_UPDATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SECRETS_DELETED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(APPLY_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SYNTHESIS_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STATUS_UPDATE_RETRIES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(MATCHING_NAMESPACES.clone()))?;

    Ok(())
}

/// Encode every registered metric in the Prometheus text format
///
/// # Errors
///
/// Fails when encoding fails or produces invalid UTF-8.
pub fn gather_text() -> Result<String> {
    use prometheus::Encoder;

    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors(kind: &str) {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_secrets_created() {
    SECRETS_CREATED_TOTAL.inc();
}

pub fn increment_secrets_updated() {
    SECRETS_UPDATED_TOTAL.inc();
}

pub fn increment_secrets_deleted() {
    SECRETS_DELETED_TOTAL.inc();
}

pub fn increment_apply_errors(action: &str) {
    APPLY_ERRORS_TOTAL.with_label_values(&[action]).inc();
}

pub fn increment_synthesis_failures() {
    SYNTHESIS_FAILURES_TOTAL.inc();
}

pub fn increment_status_update_retries() {
    STATUS_UPDATE_RETRIES_TOTAL.inc();
}

pub fn set_matching_namespaces(cluster_secret: &str, count: usize) {
    MATCHING_NAMESPACES
        .with_label_values(&[cluster_secret])
        .set(i64::try_from(count).unwrap_or(i64::MAX));
}

/// Drop the gauge series of a deleted ClusterSecret
pub fn clear_matching_namespaces(cluster_secret: &str) {
    let _ = MATCHING_NAMESPACES.remove_label_values(&[cluster_secret]);
}
