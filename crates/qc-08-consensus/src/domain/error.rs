//! Error types for the consensus subsystem

use shared_types::HlcTimestamp;

/// Consensus error types
///
/// Per-report problems are not errors (see `ReportOutcome`); these are the
/// failures that stop a tick from completing.
#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    #[error("Invalid consensus config: {0}")]
    InvalidConfig(String),

    #[error("Evaluation worker pool unavailable: {0}")]
    WorkerPool(String),

    #[error("No result payload stored for winning hash at {0}")]
    MissingResult(HlcTimestamp),

    #[error("Applying results for {hlc} failed: {reason}")]
    CommitFailed { hlc: HlcTimestamp, reason: String },

    #[error("Rolling back speculative state from {hlc} failed: {reason}")]
    RollbackFailed { hlc: HlcTimestamp, reason: String },
}

/// Result type for consensus operations
pub type ConsensusResult<T> = Result<T, ConsensusError>;
