//! Driving ports (Inbound API)

use crate::domain::{CatchupReport, CatchupResult, RepairReport, TrustedTip};
use async_trait::async_trait;
use shared_types::Block;

/// What the node process drives catchup through.
#[async_trait]
pub trait CatchupApi: Send {
    /// Self-repair, then sync to the network height and drain queued gossip.
    async fn run(&mut self) -> CatchupResult<CatchupReport>;

    /// Height a quorum of peers agrees on, `None` if no quorum formed.
    async fn discover_network_height(&self) -> Option<u64>;

    /// Replay stored blocks the state has not applied yet.
    fn repair_chain_state(&mut self) -> CatchupResult<RepairReport>;

    /// Queue a gossip block and apply whatever now extends the tip.
    ///
    /// Returns how many blocks were applied.
    fn receive_block(&mut self, block: Block) -> CatchupResult<usize>;

    /// Last verified and applied block.
    fn trusted_tip(&self) -> TrustedTip;
}
