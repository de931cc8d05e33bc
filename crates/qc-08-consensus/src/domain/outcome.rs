//! What the queue tells its caller about reports and ticks

use super::LivenessState;
use shared_types::HlcTimestamp;
use std::fmt;

/// Why a report was thrown away.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// Proof attests a different hash than the report claims.
    ProofHashMismatch,
    /// Proof signature does not verify for its signer.
    BadSignature,
    /// Claimed hash is not the hash of the attached payload.
    PayloadHashMismatch,
    /// Payload belongs to a different timestamp.
    PayloadTimestampMismatch,
    /// Payload could not be hashed.
    MalformedPayload(String),
    /// Signer is not an active masternode.
    UnknownPeer,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::ProofHashMismatch => "proof_hash_mismatch",
            RejectReason::BadSignature => "bad_signature",
            RejectReason::PayloadHashMismatch => "payload_hash_mismatch",
            RejectReason::PayloadTimestampMismatch => "payload_timestamp_mismatch",
            RejectReason::MalformedPayload(_) => "malformed_payload",
            RejectReason::UnknownPeer => "unknown_peer",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MalformedPayload(detail) => write!(f, "malformed_payload: {}", detail),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Result of `append`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReportOutcome {
    /// First vote from this peer for this timestamp.
    Accepted,
    /// Peer replaced an earlier vote; consensus reopened.
    VoteChanged,
    /// Same peer, same hash.
    Duplicate,
    /// Timestamp is at or below the last committed one.
    Stale,
    Rejected(RejectReason),
}

impl ReportOutcome {
    /// Whether the report changed the store.
    pub fn is_recorded(&self) -> bool {
        matches!(self, ReportOutcome::Accepted | ReportOutcome::VoteChanged)
    }
}

/// Where a timestamp sits in the queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryStage {
    /// Known, never evaluated.
    Pending,
    /// Evaluated at least once, no consensus yet.
    Evaluating,
    /// Agreed, waiting for earlier timestamps to commit.
    ConsensusReached,
    /// At or below the commit boundary.
    Committed,
}

/// Summary of one `process_next` call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Jobs that came back with a verdict.
    pub evaluated: usize,
    /// Jobs whose worker missed the poll window.
    pub timed_out: usize,
    /// Timestamps that reached consensus this tick.
    pub reached: Vec<HlcTimestamp>,
    /// Timestamps committed this tick, in order.
    pub committed: Vec<HlcTimestamp>,
    /// Agreed timestamps still waiting on an earlier one.
    pub held: usize,
    /// Commits that first rolled back local speculative state.
    pub rollbacks: Vec<HlcTimestamp>,
    pub liveness: LivenessState,
    /// Set on the tick that crossed the stall threshold.
    pub stalled: bool,
}
