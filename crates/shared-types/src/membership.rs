//! # Membership
//!
//! The peer-discovery table is an external collaborator. This module only
//! defines the view the core consumes: who is currently active, by role.

use crate::entities::NodeId;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Peer roles as supplied by the membership collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeerRole {
    /// Votes on results and block height.
    Masternode,
    /// Executes transactions.
    Delegate,
}

/// Current membership view.
///
/// Returned lists never include the local node.
#[async_trait]
pub trait PeerDirectory: Send + Sync {
    /// Active peers with the given role.
    async fn list_peers(&self, role: PeerRole) -> Vec<NodeId>;
}

/// Fixed membership table, mutable at runtime.
#[derive(Debug, Default)]
pub struct StaticPeerDirectory {
    peers: RwLock<BTreeMap<NodeId, PeerRole>>,
}

impl StaticPeerDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory where every peer has `role`.
    pub fn with_peers(peers: impl IntoIterator<Item = NodeId>, role: PeerRole) -> Self {
        let directory = Self::new();
        for peer in peers {
            directory.insert(peer, role);
        }
        directory
    }

    /// Add or re-role a peer.
    pub fn insert(&self, peer: NodeId, role: PeerRole) {
        self.peers.write().insert(peer, role);
    }

    /// Drop a peer (e.g. it went offline).
    pub fn remove(&self, peer: &NodeId) -> bool {
        self.peers.write().remove(peer).is_some()
    }

    /// Number of known peers across roles.
    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }
}

#[async_trait]
impl PeerDirectory for StaticPeerDirectory {
    async fn list_peers(&self, role: PeerRole) -> Vec<NodeId> {
        self.peers
            .read()
            .iter()
            .filter(|(_, r)| **r == role)
            .map(|(id, _)| *id)
            .collect()
    }
}
