//! # Intermediate Sync Queue
//!
//! Blocks learned through gossip while catchup is applying history. They are
//! held by number and drained in order once the trusted tip reaches them, so
//! gossip never races catchup's own sequential application.

use shared_types::Block;
use std::collections::BTreeMap;

/// Distinct candidates held per block number.
pub const MAX_CANDIDATES_PER_NUMBER: usize = 4;

/// Gossip blocks waiting for the tip to reach them.
///
/// Several candidates per number are kept: the first one that verifies wins.
/// Callers bound how far ahead of the tip a number may be; the queue bounds
/// how many candidates one number may hold.
#[derive(Debug, Default)]
pub struct IntermediateQueue {
    pending: BTreeMap<u64, Vec<Block>>,
}

impl IntermediateQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `block` until its number comes up.
    ///
    /// Returns false for a duplicate, or when the number already holds
    /// [`MAX_CANDIDATES_PER_NUMBER`] candidates.
    pub fn push(&mut self, block: Block) -> bool {
        let candidates = self.pending.entry(block.number).or_default();
        if candidates.len() >= MAX_CANDIDATES_PER_NUMBER
            || candidates.iter().any(|b| b.hash == block.hash)
        {
            return false;
        }
        candidates.push(block);
        true
    }

    /// Drop every candidate at or below `height`; returns how many went.
    pub fn drop_through(&mut self, height: u64) -> usize {
        let keep = self.pending.split_off(&height.saturating_add(1));
        let dropped = self.pending.values().map(Vec::len).sum();
        self.pending = keep;
        dropped
    }

    /// Candidates for `number`, removed from the queue.
    pub fn take(&mut self, number: u64) -> Option<Vec<Block>> {
        self.pending.remove(&number)
    }

    /// Queued candidates across all numbers.
    pub fn len(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
