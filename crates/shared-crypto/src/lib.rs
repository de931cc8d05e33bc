//! # Shared Crypto - Hashing, Canonical Encoding, Signatures
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA3-256 | Block and result digests |
//! | `canonical` | Sorted-key JSON | Order-independent content encoding |
//! | `block_verifier` | SHA3-256 chain | Block content hash, block validation |
//! | `signatures` | Ed25519 | Result proofs, sub-block signatures |
//!
//! ## Security Properties
//!
//! - **Canonical encoding**: semantically identical content hashes
//!   identically regardless of map insertion order
//! - **Chained hashing**: every block hash is seeded with its predecessor
//! - **Ed25519**: deterministic nonces, no RNG dependency when signing

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod block_verifier;
pub mod canonical;
pub mod errors;
pub mod hashing;
pub mod signatures;

// Re-exports
pub use block_verifier::{
    block_is_failed, block_is_skip, compute_block_hash, failed_block, seal_block,
    validate_block, verify_block_hash, verify_subblock_signatures, BlockValidationError,
};
pub use canonical::{canonical_bytes, canonicalize};
pub use errors::CryptoError;
pub use hashing::{hash_processing_result, sha3_256, Sha3Hasher};
pub use signatures::{
    Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, Ed25519Verifier, SignatureVerifier,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
