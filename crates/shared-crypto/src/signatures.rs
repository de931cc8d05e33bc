//! # Ed25519 Signatures
//!
//! Node identities are Ed25519 public keys. Peers sign result proofs and
//! sub-blocks; the core only ever verifies through [`SignatureVerifier`], so
//! the concrete scheme stays swappable.

use crate::CryptoError;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use shared_types::{
    proof_signing_message, subblock_signing_message, Hash, HlcTimestamp, NodeId, ResultProof,
    Signature, SubBlockSignature,
};
use zeroize::Zeroize;

/// Opaque signature check consumed by the consensus and catchup cores.
pub trait SignatureVerifier: Send + Sync {
    /// Whether `signature` is `signer`'s signature over `message`.
    fn verify(&self, signer: &NodeId, message: &[u8], signature: &Signature) -> bool;
}

/// Ed25519 implementation of [`SignatureVerifier`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, signer: &NodeId, message: &[u8], signature: &Signature) -> bool {
        match Ed25519PublicKey::from_bytes(signer.0) {
            Ok(key) => key
                .verify(message, &Ed25519Signature::from_bytes(*signature))
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// Ed25519 public key (32 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ed25519PublicKey([u8; 32]);

impl Ed25519PublicKey {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        // Validate it's a valid point
        VerifyingKey::from_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Verify a signature.
    pub fn verify(&self, message: &[u8], signature: &Ed25519Signature) -> Result<(), CryptoError> {
        let verifying_key =
            VerifyingKey::from_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)?;

        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);

        verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

/// Ed25519 signature (64 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ed25519Signature([u8; 64]);

impl Ed25519Signature {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

/// Ed25519 keypair: a node's signing identity.
pub struct Ed25519KeyPair {
    signing_key: SigningKey,
}

impl Ed25519KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from secret seed (32 bytes).
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        Self { signing_key }
    }

    /// Get public key.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// The node id this key signs as.
    pub fn node_id(&self) -> NodeId {
        NodeId(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message (deterministic - no RNG needed).
    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        let sig = self.signing_key.sign(message);
        Ed25519Signature(sig.to_bytes())
    }

    /// Attest `result_hash` for `hlc_timestamp`.
    pub fn sign_result(&self, hlc_timestamp: &HlcTimestamp, result_hash: Hash) -> ResultProof {
        let message = proof_signing_message(hlc_timestamp, &result_hash);
        ResultProof {
            signer: self.node_id(),
            signature: *self.sign(&message).as_bytes(),
            tx_result_hash: result_hash,
        }
    }

    /// Sign a sub-block's `(input_hash, merkle_root)` pair.
    pub fn sign_subblock(&self, input_hash: &Hash, merkle_root: &Hash) -> SubBlockSignature {
        let message = subblock_signing_message(input_hash, merkle_root);
        SubBlockSignature {
            signer: self.node_id(),
            signature: *self.sign(&message).as_bytes(),
        }
    }
}

impl Drop for Ed25519KeyPair {
    fn drop(&mut self) {
        // Zeroize secret key material
        let mut bytes = self.signing_key.to_bytes();
        bytes.zeroize();
    }
}
