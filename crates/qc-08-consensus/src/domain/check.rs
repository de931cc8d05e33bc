//! Consensus verdict record

use serde::{Deserialize, Serialize};
use shared_types::Hash;

/// Which tier produced the agreed solution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsensusType {
    /// The consensus threshold was met by identical results.
    Ideal,
    /// The leading result can no longer be overtaken.
    Eager,
    /// Deterministic tie-break after every other tier was foreclosed.
    Failed,
}

impl ConsensusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsensusType::Ideal => "ideal",
            ConsensusType::Eager => "eager",
            ConsensusType::Failed => "failed",
        }
    }
}

/// Outcome of one consensus evaluation for one timestamp.
///
/// Always replaced wholesale; the possibility flags carry forward so later
/// evaluations skip tiers that are already foreclosed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsensusCheckResult {
    pub has_consensus: bool,
    pub consensus_type: Option<ConsensusType>,
    pub solution: Option<Hash>,
    pub ideal_possible: bool,
    pub eager_possible: bool,
}

impl ConsensusCheckResult {
    /// State before any evaluation: nothing decided, every tier open.
    pub const fn initial() -> Self {
        Self {
            has_consensus: false,
            consensus_type: None,
            solution: None,
            ideal_possible: true,
            eager_possible: true,
        }
    }

    /// No decision yet.
    pub const fn undecided(ideal_possible: bool, eager_possible: bool) -> Self {
        Self {
            has_consensus: false,
            consensus_type: None,
            solution: None,
            ideal_possible,
            eager_possible,
        }
    }

    /// Agreement on `solution` via `consensus_type`.
    pub const fn reached(
        consensus_type: ConsensusType,
        solution: Hash,
        ideal_possible: bool,
        eager_possible: bool,
    ) -> Self {
        Self {
            has_consensus: true,
            consensus_type: Some(consensus_type),
            solution: Some(solution),
            ideal_possible,
            eager_possible,
        }
    }
}

impl Default for ConsensusCheckResult {
    fn default() -> Self {
        Self::initial()
    }
}
