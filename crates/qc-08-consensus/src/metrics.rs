//! # Validation Queue Metrics
//!
//! Prometheus metrics for the validation queue.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-08-consensus = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `consensus_reports_total` - Reports by admission outcome
//! - `consensus_reached_total` - Timestamps agreed, by tier
//! - `consensus_commits_total` - Timestamps committed
//! - `consensus_rollbacks_total` - Commits preceded by a speculative rollback
//! - `consensus_worker_timeouts_total` - Evaluations with no verdict in the poll window
//! - `consensus_pending_entries` - Timestamps not yet committed
//! - `consensus_evaluation_latency_seconds` - Histogram of per-tick evaluation time

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref REPORTS: IntCounterVec = register_int_counter_vec!(
        "consensus_reports_total",
        "Peer reports by admission outcome",
        &["outcome"]
    )
    .expect("Failed to create REPORTS metric");

    pub static ref CONSENSUS_REACHED: IntCounterVec = register_int_counter_vec!(
        "consensus_reached_total",
        "Timestamps that reached consensus, by tier",
        &["tier"]
    )
    .expect("Failed to create CONSENSUS_REACHED metric");

    pub static ref COMMITS: IntCounter = register_int_counter!(
        "consensus_commits_total",
        "Timestamps committed in order"
    )
    .expect("Failed to create COMMITS metric");

    pub static ref ROLLBACKS: IntCounter = register_int_counter!(
        "consensus_rollbacks_total",
        "Commits that first rolled back local speculative state"
    )
    .expect("Failed to create ROLLBACKS metric");

    pub static ref WORKER_TIMEOUTS: IntCounter = register_int_counter!(
        "consensus_worker_timeouts_total",
        "Evaluations that missed the worker poll window"
    )
    .expect("Failed to create WORKER_TIMEOUTS metric");

    pub static ref PENDING: IntGauge = register_int_gauge!(
        "consensus_pending_entries",
        "Timestamps awaiting consensus or commit"
    )
    .expect("Failed to create PENDING metric");

    pub static ref EVALUATION_LATENCY: Histogram = register_histogram!(
        "consensus_evaluation_latency_seconds",
        "Time to evaluate all unresolved timestamps in one tick",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to create EVALUATION_LATENCY metric");
}

#[cfg(feature = "metrics")]
pub fn record_report(outcome: &str) {
    REPORTS.with_label_values(&[outcome]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_consensus(tier: &str) {
    CONSENSUS_REACHED.with_label_values(&[tier]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_commit() {
    COMMITS.inc();
}

#[cfg(feature = "metrics")]
pub fn record_rollback() {
    ROLLBACKS.inc();
}

#[cfg(feature = "metrics")]
pub fn record_worker_timeout() {
    WORKER_TIMEOUTS.inc();
}

#[cfg(feature = "metrics")]
pub fn set_pending(count: usize) {
    PENDING.set(count as i64);
}

#[cfg(feature = "metrics")]
pub fn record_evaluation_latency(seconds: f64) {
    EVALUATION_LATENCY.observe(seconds);
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_report(_outcome: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_consensus(_tier: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_commit() {}

#[cfg(not(feature = "metrics"))]
pub fn record_rollback() {}

#[cfg(not(feature = "metrics"))]
pub fn record_worker_timeout() {}

#[cfg(not(feature = "metrics"))]
pub fn set_pending(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_evaluation_latency(_seconds: f64) {}
