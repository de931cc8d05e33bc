//! # Catchup Configuration
//!
//! Configuration for the catchup coordinator.

use crate::domain::{CatchupError, CatchupResult, DEFAULT_CONFIRMATIONS};
use serde::{Deserialize, Serialize};
use shared_types::PeerRole;
use std::time::Duration;

/// Catchup configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatchupConfig {
    /// Matching height claims needed before a height is trusted
    /// (capped at one fewer than the number of peers).
    pub required_confirmations: usize,

    /// Whether the local node's own height counts as a claim.
    pub local_node_votes: bool,

    /// Per-peer request timeout in milliseconds.
    pub peer_request_timeout_ms: u64,

    /// Extra attempts per peer when asking for its height.
    pub height_request_retries: u32,

    /// Overall bound on one height discovery round, in milliseconds.
    pub height_discovery_timeout_ms: u64,

    /// Pause between catchup passes that made no headway, in milliseconds.
    pub retry_delay_ms: u64,

    /// Seconds without progress before the operator is warned.
    pub progress_timeout_secs: u64,

    /// Give up after this many passes (`None` retries forever).
    pub max_passes: Option<u32>,

    /// Require valid sub-block signatures on fetched blocks.
    pub verify_signatures: bool,

    /// Distinct valid signers required per sub-block when verifying.
    pub min_subblock_signatures: usize,

    /// Which peers are asked for heights and blocks.
    pub peer_role: PeerRole,

    /// Gossip blocks further than this above the tip (or the last
    /// discovered network height, whichever is higher) are dropped.
    pub max_gossip_ahead: u64,
}

impl Default for CatchupConfig {
    fn default() -> Self {
        Self {
            required_confirmations: DEFAULT_CONFIRMATIONS,
            local_node_votes: false,
            peer_request_timeout_ms: 1_000,
            height_request_retries: 1,
            height_discovery_timeout_ms: 5_000,
            retry_delay_ms: 1_000,
            progress_timeout_secs: 60,
            max_passes: None,
            verify_signatures: false,
            min_subblock_signatures: 1,
            peer_role: PeerRole::Masternode,
            max_gossip_ahead: 1_024,
        }
    }
}

impl CatchupConfig {
    /// Create a config for testing (short timeouts, bounded passes).
    pub fn for_testing() -> Self {
        Self {
            required_confirmations: 1,
            peer_request_timeout_ms: 100,
            height_request_retries: 0,
            height_discovery_timeout_ms: 500,
            retry_delay_ms: 50,
            progress_timeout_secs: 1,
            max_passes: Some(3),
            max_gossip_ahead: 16,
            ..Self::default()
        }
    }

    /// Reject values the coordinator cannot run with.
    pub fn validate(&self) -> CatchupResult<()> {
        if self.required_confirmations == 0 {
            return Err(CatchupError::InvalidConfig(
                "required_confirmations must be at least 1".to_string(),
            ));
        }
        if self.verify_signatures && self.min_subblock_signatures == 0 {
            return Err(CatchupError::InvalidConfig(
                "min_subblock_signatures must be at least 1 when verifying".to_string(),
            ));
        }
        if self.max_gossip_ahead == 0 {
            return Err(CatchupError::InvalidConfig(
                "max_gossip_ahead must be at least 1".to_string(),
            ));
        }
        if self.max_passes == Some(0) {
            return Err(CatchupError::InvalidConfig(
                "max_passes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-peer request timeout.
    pub fn peer_request_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_request_timeout_ms)
    }

    /// Overall height discovery bound.
    pub fn height_discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.height_discovery_timeout_ms)
    }

    /// Pause between unproductive passes.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// No-progress warning threshold.
    pub fn progress_timeout(&self) -> Duration {
        Duration::from_secs(self.progress_timeout_secs)
    }
}
