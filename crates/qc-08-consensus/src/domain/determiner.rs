//! Consensus determiner
//!
//! Pure decision over one timestamp's votes. Three tiers, tried in order,
//! each only while the previous evaluation left it possible:
//!
//! ```text
//! ideal  ── top tally >= ceil(n * percent / 100)
//!   │ impossible once top + missing < needed
//!   ↓
//! eager  ── top > runner-up + missing (cannot be overtaken)
//!   │ impossible once every report is in and the top is tied
//!   ↓
//! failed ── smallest tied hash (big-endian = base-16 numeric order)
//! ```
//!
//! `n` is the active participant count at evaluation time, not a static
//! constitution size: when peers drop, `missing` shrinks with them.

use super::{ConsensusCheckResult, ConsensusType};
use shared_types::{Hash, NodeId, Tally};
use std::collections::BTreeMap;

/// Matching reports needed for ideal consensus: `ceil(n * percent / 100)`.
pub fn consensus_needed(num_participants: usize, consensus_percent: u8) -> usize {
    (num_participants * consensus_percent as usize).div_ceil(100)
}

/// Count identical result hashes.
pub fn tally_solutions(solutions: &BTreeMap<NodeId, Hash>) -> Tally<Hash> {
    solutions.values().copied().collect()
}

/// Reports still outstanding from the active set.
fn missing_reports(tally: &Tally<Hash>, num_participants: usize) -> usize {
    num_participants.saturating_sub(tally.total())
}

/// Ideal tier.
pub fn check_ideal_consensus(
    tally: &Tally<Hash>,
    num_participants: usize,
    consensus_percent: u8,
) -> ConsensusCheckResult {
    let needed = consensus_needed(num_participants, consensus_percent).max(1);

    if tally.total() < needed {
        return ConsensusCheckResult::undecided(true, true);
    }

    let top = tally.top_count();
    if let Some(solution) = tally.confirmed(needed) {
        return ConsensusCheckResult::reached(ConsensusType::Ideal, *solution, true, true);
    }

    if top + missing_reports(tally, num_participants) >= needed {
        return ConsensusCheckResult::undecided(true, true);
    }

    ConsensusCheckResult::undecided(false, true)
}

/// Eager tier, only meaningful once ideal is foreclosed.
pub fn check_eager_consensus(tally: &Tally<Hash>, num_participants: usize) -> ConsensusCheckResult {
    let missing = missing_reports(tally, num_participants);

    if let Some(solution) = tally.top_item() {
        if tally.top_count() > tally.runner_up_count() + missing {
            return ConsensusCheckResult::reached(ConsensusType::Eager, *solution, false, true);
        }
    }

    if missing == 0 {
        return ConsensusCheckResult::undecided(false, false);
    }

    ConsensusCheckResult::undecided(false, true)
}

/// Failed tier: deterministic tie-break every honest node computes alike.
pub fn check_failed_consensus(tally: &Tally<Hash>) -> ConsensusCheckResult {
    match tally.top_item() {
        Some(solution) => {
            ConsensusCheckResult::reached(ConsensusType::Failed, *solution, false, false)
        }
        None => ConsensusCheckResult::undecided(false, false),
    }
}

/// Run the tiers against the current votes.
pub fn determine_consensus(
    solutions: &BTreeMap<NodeId, Hash>,
    num_participants: usize,
    last_check_info: &ConsensusCheckResult,
    consensus_percent: u8,
) -> ConsensusCheckResult {
    if solutions.is_empty() || num_participants == 0 {
        return ConsensusCheckResult::initial();
    }

    let tally = tally_solutions(solutions);

    if last_check_info.ideal_possible {
        let ideal = check_ideal_consensus(&tally, num_participants, consensus_percent);
        if ideal.has_consensus || ideal.ideal_possible {
            return ConsensusCheckResult {
                eager_possible: last_check_info.eager_possible,
                ..ideal
            };
        }
    }

    if last_check_info.eager_possible {
        let eager = check_eager_consensus(&tally, num_participants);
        if eager.has_consensus || eager.eager_possible {
            return eager;
        }
    }

    check_failed_consensus(&tally)
}

/// Determiner bound to a consensus threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsensusDeterminer {
    consensus_percent: u8,
}

impl ConsensusDeterminer {
    pub fn new(consensus_percent: u8) -> Self {
        Self { consensus_percent }
    }

    pub fn consensus_percent(&self) -> u8 {
        self.consensus_percent
    }

    pub fn determine(
        &self,
        solutions: &BTreeMap<NodeId, Hash>,
        num_participants: usize,
        last_check_info: &ConsensusCheckResult,
    ) -> ConsensusCheckResult {
        determine_consensus(
            solutions,
            num_participants,
            last_check_info,
            self.consensus_percent,
        )
    }
}
