//! # Peer Messages
//!
//! Tagged message types, decoded at the transport boundary before reaching
//! the consensus or catchup cores. Framing and encoding live elsewhere.

use crate::entities::{Block, HeightClaim, PeerReport};
use serde::{Deserialize, Serialize};

/// Gossip delivered to the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeerMessage {
    /// A peer's vote for one logical timestamp.
    ConsensusVote(PeerReport),
    /// A newly minted block.
    Block(Block),
}

/// Catchup RPC requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatchupRequest {
    /// "What is your height?"
    LatestHeight,
    /// Fetch one block by number.
    GetBlock { number: u64 },
}

/// Catchup RPC responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatchupResponse {
    Height(HeightClaim),
    Block { block: Option<Block> },
}
