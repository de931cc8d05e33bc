//! # Catchup Metrics
//!
//! Prometheus metrics for chain catchup, behind the `metrics` feature.
//!
//! ## Metrics Exported
//!
//! - `catchup_blocks_applied_total` - Blocks applied, by source (peer, gossip, repair)
//! - `catchup_rejected_blocks_total` - Peer or gossip blocks that failed verification
//! - `catchup_network_height` - Last quorum height
//! - `catchup_local_height` - Trusted tip
//! - `catchup_passes_total` - Discover-and-fetch passes
//! - `catchup_stalls_total` - No-progress warnings and pass-limit exhaustion
//! - `catchup_gossip_queued_total` - Gossip blocks held in the intermediate queue

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref BLOCKS_APPLIED: IntCounterVec = register_int_counter_vec!(
        "catchup_blocks_applied_total",
        "Blocks applied to storage and state, by source",
        &["source"]
    )
    .expect("Failed to create BLOCKS_APPLIED metric");

    pub static ref REJECTED_BLOCKS: IntCounterVec = register_int_counter_vec!(
        "catchup_rejected_blocks_total",
        "Blocks that failed verification, by reason",
        &["reason"]
    )
    .expect("Failed to create REJECTED_BLOCKS metric");

    pub static ref NETWORK_HEIGHT: IntGauge = register_int_gauge!(
        "catchup_network_height",
        "Height last agreed by a quorum of peers"
    )
    .expect("Failed to create NETWORK_HEIGHT metric");

    pub static ref LOCAL_HEIGHT: IntGauge = register_int_gauge!(
        "catchup_local_height",
        "Trusted tip height"
    )
    .expect("Failed to create LOCAL_HEIGHT metric");

    pub static ref PASSES: IntCounter = register_int_counter!(
        "catchup_passes_total",
        "Discover-and-fetch passes attempted"
    )
    .expect("Failed to create PASSES metric");

    pub static ref STALLS: IntCounter = register_int_counter!(
        "catchup_stalls_total",
        "Catchup liveness warnings"
    )
    .expect("Failed to create STALLS metric");

    pub static ref GOSSIP_QUEUED: IntCounter = register_int_counter!(
        "catchup_gossip_queued_total",
        "Gossip blocks queued during catchup"
    )
    .expect("Failed to create GOSSIP_QUEUED metric");
}

#[cfg(feature = "metrics")]
pub fn record_block_applied(source: &str) {
    BLOCKS_APPLIED.with_label_values(&[source]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_rejected(reason: &str) {
    REJECTED_BLOCKS.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn set_network_height(height: u64) {
    NETWORK_HEIGHT.set(height as i64);
}

#[cfg(feature = "metrics")]
pub fn set_local_height(height: u64) {
    LOCAL_HEIGHT.set(height as i64);
}

#[cfg(feature = "metrics")]
pub fn record_pass() {
    PASSES.inc();
}

#[cfg(feature = "metrics")]
pub fn record_stall() {
    STALLS.inc();
}

#[cfg(feature = "metrics")]
pub fn record_gossip_queued() {
    GOSSIP_QUEUED.inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_block_applied(_source: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn set_network_height(_height: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn set_local_height(_height: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_pass() {}

#[cfg(not(feature = "metrics"))]
pub fn record_stall() {}

#[cfg(not(feature = "metrics"))]
pub fn record_gossip_queued() {}
