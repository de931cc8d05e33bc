//! # Block Fetch
//!
//! Every peer is asked for the same block number; the first response that
//! verifies against the trusted tip wins and the rest are discarded. This
//! tolerates lying or corrupted peers without tracking reputation.
//!
//! A peer answering with the failure marker, with nothing, or with the wrong
//! kind of response simply has no candidate for this number.

use shared_crypto::{
    validate_block, verify_subblock_signatures, BlockValidationError, SignatureVerifier,
};
use shared_types::{Block, CatchupResponse, Hash};

/// Sub-block signature requirement applied on top of the hash checks.
pub struct SignaturePolicy<'a> {
    /// Signature check.
    pub verifier: &'a dyn SignatureVerifier,
    /// Distinct valid signers required per sub-block.
    pub min_valid: usize,
}

/// One peer's contribution to a block fetch.
#[derive(Debug)]
pub enum BlockCandidate {
    /// Extends the trusted tip.
    Verified(Block),
    /// A block came back but failed verification.
    Rejected(BlockValidationError),
    /// No usable answer.
    Absent,
}

/// Classify one peer response for block `expected_number` on top of
/// `trusted_previous`.
pub fn classify_response(
    response: Option<CatchupResponse>,
    expected_number: u64,
    trusted_previous: &Hash,
    signatures: Option<&SignaturePolicy<'_>>,
) -> BlockCandidate {
    match response {
        Some(CatchupResponse::Block { block: Some(block) }) => {
            verify_candidate(block, expected_number, trusted_previous, signatures)
        }
        _ => BlockCandidate::Absent,
    }
}

/// Verify a block from any source (peer response or gossip) against the
/// trusted tip.
pub fn verify_candidate(
    block: Block,
    expected_number: u64,
    trusted_previous: &Hash,
    signatures: Option<&SignaturePolicy<'_>>,
) -> BlockCandidate {
    match validate_block(&block, expected_number, trusted_previous) {
        Ok(()) => {}
        Err(BlockValidationError::FailedBlock { .. }) => return BlockCandidate::Absent,
        Err(e) => return BlockCandidate::Rejected(e),
    }

    if let Some(policy) = signatures {
        if let Err(e) = verify_subblock_signatures(&block, policy.verifier, policy.min_valid) {
            return BlockCandidate::Rejected(e);
        }
    }

    BlockCandidate::Verified(block)
}

/// Short label for a rejection, used in metrics.
pub fn rejection_label(error: &BlockValidationError) -> &'static str {
    match error {
        BlockValidationError::FailedBlock { .. } => "failed_marker",
        BlockValidationError::WrongNumber { .. } => "wrong_number",
        BlockValidationError::PreviousMismatch { .. } => "previous_mismatch",
        BlockValidationError::HashMismatch { .. } => "hash_mismatch",
        BlockValidationError::Format(_) => "malformed",
        BlockValidationError::InsufficientSignatures { .. } => "signatures",
    }
}
