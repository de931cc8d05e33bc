//! # Domain Entities
//!
//! - [`TrustedTip`]: the last block this node has verified and applied
//! - [`CatchupReport`]: what one `run` accomplished
//! - [`RepairReport`]: what self-repair replayed or found broken

use serde::{Deserialize, Serialize};
use shared_types::{Block, Hash, GENESIS_HASH};

// =============================================================================
// TRUSTED TIP
// =============================================================================

/// Highest verified and applied block.
///
/// Every fetched block is checked against this tip: its number must be one
/// higher and its `previous` must equal the tip hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedTip {
    /// Block number (0 before any block).
    pub number: u64,
    /// Block hash (`GENESIS_HASH` before any block).
    pub hash: Hash,
}

impl TrustedTip {
    /// Tip of an empty chain.
    pub fn genesis() -> Self {
        Self {
            number: 0,
            hash: GENESIS_HASH,
        }
    }

    /// Create at a known position.
    pub fn new(number: u64, hash: Hash) -> Self {
        Self { number, hash }
    }

    /// Number the next block must carry.
    pub fn next_number(&self) -> u64 {
        self.number.saturating_add(1)
    }

    /// Move onto `block`.
    pub fn advance(&mut self, block: &Block) {
        self.number = block.number;
        self.hash = block.hash;
    }
}

impl Default for TrustedTip {
    fn default() -> Self {
        Self::genesis()
    }
}

// =============================================================================
// CATCHUP REPORT
// =============================================================================

/// Summary of one catchup run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatchupReport {
    /// Trusted tip when the run started (after self-repair).
    pub start_height: u64,
    /// Quorum height the run synced to.
    pub target_height: u64,
    /// Trusted tip when the run finished.
    pub final_height: u64,
    /// Blocks fetched from peers and applied.
    pub blocks_applied: u64,
    /// Peer blocks that failed verification.
    pub rejected_responses: u64,
    /// Discover-and-fetch passes attempted.
    pub passes: u32,
    /// Gossip blocks drained from the intermediate queue afterwards.
    pub gossip_applied: u64,
    /// Self-repair performed before the first pass.
    pub repair: RepairReport,
}

impl CatchupReport {
    /// Blocks this node is still missing relative to the target.
    pub fn remaining(&self) -> u64 {
        self.target_height.saturating_sub(self.final_height)
    }
}

// =============================================================================
// REPAIR REPORT
// =============================================================================

/// Result of a self-repair pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Stored blocks whose state was replayed
    pub blocks_replayed: u64,
    /// Transactions covered by the replayed blocks
    pub transactions_replayed: u64,
    /// State height before repair
    pub state_height_before: u64,
    /// Stored chain height before repair
    pub stored_height_before: u64,
    /// Height both agree on after repair
    pub height_after: u64,
    /// Problems found (non-fatal, logged and reported)
    pub issues: Vec<RepairIssue>,
}

impl RepairReport {
    /// Create empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether storage and state were consistent to begin with.
    pub fn was_consistent(&self) -> bool {
        self.blocks_replayed == 0 && self.issues.is_empty()
    }

    /// Record one replayed block.
    pub fn add_block(&mut self, number: u64, tx_count: usize) {
        self.blocks_replayed += 1;
        self.transactions_replayed += tx_count as u64;
        self.height_after = self.height_after.max(number);
    }

    /// Record a problem.
    pub fn add_issue(&mut self, issue: RepairIssue) {
        self.issues.push(issue);
    }
}

/// What self-repair could not fix locally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RepairIssue {
    /// Stored chain claims a block that is not there.
    MissingBlock {
        /// Missing block number
        number: u64,
    },
    /// A stored block failed verification; storage is truncated before it.
    InvalidBlock {
        /// Offending block number
        number: u64,
        /// Verification failure
        reason: String,
    },
    /// Replaying a stored block's state deltas failed.
    StateWrite {
        /// Block being replayed
        number: u64,
        /// Storage failure
        reason: String,
    },
    /// State has applied blocks storage does not hold; catchup refetches them.
    StateAhead {
        /// Applied state height
        state_height: u64,
        /// Stored chain height
        stored_height: u64,
    },
    /// State and storage agree on height but not on the block hash.
    HashMismatch {
        /// Height of the disagreement
        height: u64,
    },
}
