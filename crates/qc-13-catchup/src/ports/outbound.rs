//! Driven ports (Outbound dependencies)

use async_trait::async_trait;
use shared_types::{
    Block, CatchupRequest, CatchupResponse, Hash, NodeId, StateDelta, StorageError,
};
use std::time::Duration;

/// Single round-trip RPC to one peer.
///
/// Implementations must give up after `timeout` and return `None`; no
/// retries are implied.
#[async_trait]
pub trait PeerNetwork: Send + Sync {
    /// Send `request` to `peer` and wait at most `timeout` for the answer.
    async fn send_request(
        &self,
        peer: &NodeId,
        request: CatchupRequest,
        timeout: Duration,
    ) -> Option<CatchupResponse>;
}

/// Persistent block storage.
pub trait BlockStore: Send + Sync {
    /// Block by number.
    fn get_block(&self, number: u64) -> Option<Block>;

    /// Store a block (overwrites any block with the same number).
    fn put_block(&self, block: Block) -> Result<(), StorageError>;

    /// Number of the latest block on the stored chain (0 when empty).
    fn latest_height(&self) -> u64;

    /// Hash of the latest block on the stored chain.
    fn latest_hash(&self) -> Hash;

    /// Move the stored chain head.
    fn set_latest(&self, height: u64, hash: Hash) -> Result<(), StorageError>;
}

/// Live application state derived from applied blocks.
pub trait StateStore: Send + Sync {
    /// Apply the state writes of block `number`, in order.
    fn apply_state_deltas(
        &self,
        number: u64,
        block_hash: &Hash,
        deltas: &[StateDelta],
    ) -> Result<(), StorageError>;

    /// Highest block whose deltas have been applied.
    fn applied_height(&self) -> u64;

    /// Hash of that block.
    fn applied_hash(&self) -> Hash;
}
