//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Ordering**: [`HlcTimestamp`], the unit-of-work identity
//! - **Agreement**: [`ProcessingResult`], [`ResultProof`], [`PeerReport`]
//! - **Chain**: [`Block`], [`SubBlock`], [`TxResult`], [`StateDelta`]
//! - **Networking**: [`NodeId`], [`HeightClaim`]

use crate::errors::TimestampParseError;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// PRIMITIVES
// =============================================================================

/// A 32-byte digest (SHA3-256).
pub type Hash = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// Hash of the (virtual) block preceding block 1.
pub const GENESIS_HASH: Hash = [0u8; 32];

/// Unique identifier for a node in the network (its Ed25519 public key).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct NodeId(pub [u8; 32]);

/// A peer identifier (alias for `NodeId` in peer contexts).
pub type PeerId = NodeId;

impl NodeId {
    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First four bytes in hex, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.short())
    }
}

/// Hybrid logical clock timestamp.
///
/// Orders first by wall-clock nanoseconds, then by the tie-breaking counter.
/// Cluster-wide uniqueness is assumed, not enforced here.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct HlcTimestamp {
    /// Wall-clock component in nanoseconds since the Unix epoch.
    pub wall_nanos: u64,
    /// Monotonic counter for events sharing a wall-clock reading.
    pub counter: u32,
}

impl HlcTimestamp {
    /// Create a timestamp from its components.
    pub const fn new(wall_nanos: u64, counter: u32) -> Self {
        Self {
            wall_nanos,
            counter,
        }
    }

    /// Canonical byte encoding used in signed messages.
    pub fn to_signing_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for HlcTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:020}_{}", self.wall_nanos, self.counter)
    }
}

impl fmt::Debug for HlcTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hlc({})", self)
    }
}

impl FromStr for HlcTimestamp {
    type Err = TimestampParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (wall, counter) = s
            .split_once('_')
            .ok_or_else(|| TimestampParseError::Malformed(s.to_string()))?;
        let wall_nanos = wall
            .parse::<u64>()
            .map_err(|_| TimestampParseError::InvalidComponent(s.to_string()))?;
        let counter = counter
            .parse::<u32>()
            .map_err(|_| TimestampParseError::InvalidComponent(s.to_string()))?;
        Ok(Self::new(wall_nanos, counter))
    }
}

// =============================================================================
// AGREEMENT
// =============================================================================

/// A single key/value write produced by executing a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    pub key: String,
    pub value: serde_json::Value,
}

/// The outcome of executing one transaction.
///
/// `payload` is the opaque execution record (dict-shaped); its key order is
/// irrelevant because hashing canonicalizes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxResult {
    /// Hash of the transaction that was executed.
    pub tx_hash: Hash,
    /// Execution status code (0 = success).
    pub status: u32,
    /// Opaque execution record.
    pub payload: serde_json::Value,
    /// State writes produced by the transaction.
    pub state: Vec<StateDelta>,
}

/// Full result payload behind a result hash.
///
/// This is what gets committed once consensus is reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub hlc_timestamp: HlcTimestamp,
    pub tx_result: TxResult,
}

/// A peer's signed attestation over a result hash.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultProof {
    /// The attesting peer.
    pub signer: NodeId,
    /// Signature over `proof_signing_message(hlc, tx_result_hash)`.
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
    /// The result hash being attested.
    pub tx_result_hash: Hash,
}

/// A consensus vote: one peer's result for one logical timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerReport {
    pub hlc_timestamp: HlcTimestamp,
    pub result_hash: Hash,
    pub proof: ResultProof,
    pub full_payload: ProcessingResult,
}

impl PeerReport {
    /// The voting peer (the proof signer is authoritative).
    pub fn peer(&self) -> NodeId {
        self.proof.signer
    }
}

/// Message a peer signs when attesting a result.
pub fn proof_signing_message(hlc_timestamp: &HlcTimestamp, result_hash: &Hash) -> Vec<u8> {
    let mut message = hlc_timestamp.to_signing_bytes();
    message.extend_from_slice(result_hash);
    message
}

// =============================================================================
// CHAIN
// =============================================================================

/// A signature over a sub-block, excluded from the block content hash.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubBlockSignature {
    pub signer: NodeId,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

/// An independently verifiable slice of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubBlock {
    pub input_hash: Hash,
    pub transactions: Vec<TxResult>,
    pub merkle_root: Hash,
    pub signatures: Vec<SubBlockSignature>,
}

/// Message a sub-block signer attests.
pub fn subblock_signing_message(input_hash: &Hash, merkle_root: &Hash) -> Vec<u8> {
    let mut message = Vec::with_capacity(64);
    message.extend_from_slice(input_hash);
    message.extend_from_slice(merkle_root);
    message
}

/// A block of the agreed history.
///
/// `subblocks == None` is only used by the failed-block marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub hash: Hash,
    pub number: u64,
    pub previous: Hash,
    pub subblocks: Option<Vec<SubBlock>>,
}

impl Block {
    /// Sub-blocks in order (empty for the failed marker).
    pub fn subblocks(&self) -> &[SubBlock] {
        self.subblocks.as_deref().unwrap_or(&[])
    }

    /// Total transaction count across sub-blocks.
    pub fn tx_count(&self) -> usize {
        self.subblocks().iter().map(|sb| sb.transactions.len()).sum()
    }

    /// All state writes carried by this block, in application order.
    pub fn state_deltas(&self) -> Vec<StateDelta> {
        self.subblocks()
            .iter()
            .flat_map(|sb| sb.transactions.iter())
            .flat_map(|tx| tx.state.iter().cloned())
            .collect()
    }

    /// First four bytes of the hash in hex, for log lines.
    pub fn short_hash(&self) -> String {
        hex::encode(&self.hash[..4])
    }
}

/// A peer's answer to "what is your height".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightClaim {
    pub height: u64,
    pub hash: Hash,
}
