//! # In-Process Network
//!
//! Routes catchup requests straight to other nodes' block stores, with
//! per-peer misbehaviour for exercising the failure policy.

use crate::adapters::InMemoryBlockStore;
use crate::application::answer_request;
use crate::ports::PeerNetwork;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{CatchupRequest, CatchupResponse, NodeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How a simulated peer answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerBehaviour {
    /// Answers from its store.
    Honest,
    /// Never answers.
    Unreachable,
    /// Answers honestly after a delay.
    Delayed(Duration),
    /// Lies about its height; blocks are served honestly.
    ClaimsHeight(u64),
    /// Serves blocks with a corrupted hash.
    CorruptBlocks,
}

type PeerEntry = (Arc<InMemoryBlockStore>, PeerBehaviour);

/// Peers living in this process.
#[derive(Debug, Default)]
pub struct InProcessNetwork {
    peers: RwLock<HashMap<NodeId, PeerEntry>>,
    requests: AtomicU64,
}

impl InProcessNetwork {
    /// Create a network with no peers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve requests to `peer` from `store`.
    pub fn add_peer(&self, peer: NodeId, store: Arc<InMemoryBlockStore>, behaviour: PeerBehaviour) {
        self.peers.write().insert(peer, (store, behaviour));
    }

    /// Change how `peer` answers; returns false if unknown.
    pub fn set_behaviour(&self, peer: &NodeId, behaviour: PeerBehaviour) -> bool {
        match self.peers.write().get_mut(peer) {
            Some(entry) => {
                entry.1 = behaviour;
                true
            }
            None => false,
        }
    }

    /// Requests sent so far, answered or not.
    pub fn requests_sent(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    fn lookup(&self, peer: &NodeId) -> Option<PeerEntry> {
        self.peers.read().get(peer).cloned()
    }
}

#[async_trait]
impl PeerNetwork for InProcessNetwork {
    async fn send_request(
        &self,
        peer: &NodeId,
        request: CatchupRequest,
        timeout: Duration,
    ) -> Option<CatchupResponse> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let (store, behaviour) = self.lookup(peer)?;

        match behaviour {
            PeerBehaviour::Unreachable => {
                tokio::time::sleep(timeout).await;
                return None;
            }
            PeerBehaviour::Delayed(delay) if delay >= timeout => {
                tokio::time::sleep(timeout).await;
                return None;
            }
            PeerBehaviour::Delayed(delay) => tokio::time::sleep(delay).await,
            _ => {}
        }

        let mut response = answer_request(store.as_ref(), request);
        match (behaviour, &mut response) {
            (PeerBehaviour::ClaimsHeight(height), CatchupResponse::Height(claim)) => {
                claim.height = height;
            }
            (PeerBehaviour::CorruptBlocks, CatchupResponse::Block { block: Some(block) }) => {
                block.hash[0] ^= 0xFF;
            }
            _ => {}
        }
        Some(response)
    }
}
