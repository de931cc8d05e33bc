//! # Consensus Configuration

use crate::domain::{ConsensusError, ConsensusResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default share of participants that must agree for ideal consensus.
pub const DEFAULT_CONSENSUS_PERCENT: u8 = 51;

/// Validation queue configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Percent of active participants needed for ideal consensus (1-100).
    pub consensus_percent: u8,

    /// Whether the local node votes (counts as a participant).
    pub local_node_votes: bool,

    /// Worker threads for parallel consensus evaluation.
    pub evaluator_threads: usize,

    /// How long the queue waits on each worker per tick, in milliseconds.
    pub worker_poll_timeout_ms: u64,

    /// Interval between evaluation ticks, in milliseconds.
    pub tick_interval_ms: u64,

    /// Consecutive ticks with pending work and no commit before a liveness
    /// warning is raised.
    pub stall_ticks_warning: u64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            consensus_percent: DEFAULT_CONSENSUS_PERCENT,
            local_node_votes: true,
            evaluator_threads: num_cpus::get(),
            worker_poll_timeout_ms: 25,
            tick_interval_ms: 50,
            stall_ticks_warning: 200,
        }
    }
}

impl ConsensusConfig {
    /// Create a config for testing (small pool, generous poll window).
    pub fn for_testing() -> Self {
        Self {
            consensus_percent: DEFAULT_CONSENSUS_PERCENT,
            local_node_votes: true,
            evaluator_threads: 2,
            worker_poll_timeout_ms: 500,
            tick_interval_ms: 10,
            stall_ticks_warning: 5,
        }
    }

    /// Reject values the queue cannot run with.
    pub fn validate(&self) -> ConsensusResult<()> {
        if self.consensus_percent == 0 || self.consensus_percent > 100 {
            return Err(ConsensusError::InvalidConfig(format!(
                "consensus_percent must be 1-100, got {}",
                self.consensus_percent
            )));
        }
        if self.evaluator_threads == 0 {
            return Err(ConsensusError::InvalidConfig(
                "evaluator_threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn worker_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.worker_poll_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
