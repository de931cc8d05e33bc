//! # Block Verifier
//!
//! Recomputes a block's content hash from its ordered sub-blocks and checks
//! it against the claimed hash. Pure functions, no I/O.
//!
//! ## Hash Construction
//!
//! ```text
//! h = SHA3-256()
//! h.update(previous_hash)
//! for sb in subblocks:                         // fixed order
//!     h.update(canonical({input_hash, transactions, merkle_root}))
//! block.hash = h.finalize()
//! ```
//!
//! Signatures are not part of the attested content and are left out.

use crate::canonical::canonical_bytes;
use crate::hashing::Sha3Hasher;
use crate::signatures::SignatureVerifier;
use crate::CryptoError;
use serde::Serialize;
use shared_types::{subblock_signing_message, Block, Hash, SubBlock, TxResult};
use std::collections::HashSet;
use thiserror::Error;

/// Sentinel hash carried by the failed-block marker.
const FAILED_BLOCK_HASH: Hash = [0u8; 32];

/// Why a block was rejected.
#[derive(Debug, Error)]
pub enum BlockValidationError {
    #[error("Block {number} is a failure marker")]
    FailedBlock { number: u64 },

    #[error("Wrong block number: expected {expected}, got {actual}")]
    WrongNumber { expected: u64, actual: u64 },

    #[error("Block {number} does not extend the trusted tip")]
    PreviousMismatch { number: u64 },

    #[error("Block {number} hash does not match its content")]
    HashMismatch { number: u64 },

    #[error("Block content is malformed: {0}")]
    Format(#[from] CryptoError),

    #[error("Sub-block {index} has {valid} valid signatures, need {required}")]
    InsufficientSignatures {
        index: usize,
        valid: usize,
        required: usize,
    },
}

/// The signed-over view of a sub-block.
#[derive(Serialize)]
struct AttestedSubBlock<'a> {
    input_hash: &'a Hash,
    transactions: &'a [TxResult],
    merkle_root: &'a Hash,
}

impl<'a> From<&'a SubBlock> for AttestedSubBlock<'a> {
    fn from(sb: &'a SubBlock) -> Self {
        Self {
            input_hash: &sb.input_hash,
            transactions: &sb.transactions,
            merkle_root: &sb.merkle_root,
        }
    }
}

/// Content hash of a block with the given predecessor and sub-blocks.
pub fn compute_block_hash(previous: &Hash, subblocks: &[SubBlock]) -> Result<Hash, CryptoError> {
    let mut hasher = Sha3Hasher::new();
    hasher.update(previous);
    for subblock in subblocks {
        let encoded = canonical_bytes(&AttestedSubBlock::from(subblock))?;
        hasher.update(&encoded);
    }
    Ok(hasher.finalize())
}

/// Whether the block's claimed hash matches its content.
///
/// The failed marker never verifies: it has no content to hash.
pub fn verify_block_hash(block: &Block) -> Result<bool, CryptoError> {
    match &block.subblocks {
        None => Ok(false),
        Some(subblocks) => Ok(compute_block_hash(&block.previous, subblocks)? == block.hash),
    }
}

/// A block with no sub-blocks, or none carrying transactions (an empty round).
pub fn block_is_skip(block: &Block) -> bool {
    match &block.subblocks {
        None => false,
        Some(subblocks) => subblocks.iter().all(|sb| sb.transactions.is_empty()),
    }
}

/// The explicit failure marker: all-zero hash and no sub-blocks.
pub fn block_is_failed(block: &Block) -> bool {
    block.hash == FAILED_BLOCK_HASH && block.subblocks.is_none()
}

/// The failure marker for `number`.
pub fn failed_block(number: u64, previous: Hash) -> Block {
    Block {
        hash: FAILED_BLOCK_HASH,
        number,
        previous,
        subblocks: None,
    }
}

/// Build a block whose hash is computed from its content.
pub fn seal_block(number: u64, previous: Hash, subblocks: Vec<SubBlock>) -> Result<Block, CryptoError> {
    let hash = compute_block_hash(&previous, &subblocks)?;
    Ok(Block {
        hash,
        number,
        previous,
        subblocks: Some(subblocks),
    })
}

/// Check that `block` is the next block on top of a trusted tip.
///
/// Order of checks: failure marker, number, previous link, content hash.
pub fn validate_block(
    block: &Block,
    expected_number: u64,
    trusted_previous: &Hash,
) -> Result<(), BlockValidationError> {
    if block_is_failed(block) {
        return Err(BlockValidationError::FailedBlock {
            number: block.number,
        });
    }

    if block.number != expected_number {
        return Err(BlockValidationError::WrongNumber {
            expected: expected_number,
            actual: block.number,
        });
    }

    if &block.previous != trusted_previous {
        return Err(BlockValidationError::PreviousMismatch {
            number: block.number,
        });
    }

    if !verify_block_hash(block)? {
        return Err(BlockValidationError::HashMismatch {
            number: block.number,
        });
    }

    Ok(())
}

/// Require at least `min_valid` distinct valid signers on every sub-block.
pub fn verify_subblock_signatures(
    block: &Block,
    verifier: &dyn SignatureVerifier,
    min_valid: usize,
) -> Result<(), BlockValidationError> {
    for (index, subblock) in block.subblocks().iter().enumerate() {
        let message = subblock_signing_message(&subblock.input_hash, &subblock.merkle_root);
        let valid: HashSet<_> = subblock
            .signatures
            .iter()
            .filter(|s| verifier.verify(&s.signer, &message, &s.signature))
            .map(|s| s.signer)
            .collect();

        if valid.len() < min_valid {
            return Err(BlockValidationError::InsufficientSignatures {
                index,
                valid: valid.len(),
                required: min_valid,
            });
        }
    }
    Ok(())
}
