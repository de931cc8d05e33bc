//! # Catchup Responder
//!
//! The serving half of the catchup protocol: what a node answers when a
//! peer asks for its height or a block.

use crate::ports::BlockStore;
use shared_types::{CatchupRequest, CatchupResponse, HeightClaim};

/// Answer one catchup request from local storage.
///
/// Blocks above the stored head are not served even if present.
pub fn answer_request<B: BlockStore + ?Sized>(blocks: &B, request: CatchupRequest) -> CatchupResponse {
    match request {
        CatchupRequest::LatestHeight => CatchupResponse::Height(HeightClaim {
            height: blocks.latest_height(),
            hash: blocks.latest_hash(),
        }),
        CatchupRequest::GetBlock { number } => {
            let block = if number <= blocks.latest_height() {
                blocks.get_block(number)
            } else {
                None
            };
            CatchupResponse::Block { block }
        }
    }
}
