//! # Test Support
//!
//! An in-process masternode network. Every node runs a real validation
//! queue; agreed results are minted into blocks by [`ChainCommitter`].

use async_trait::async_trait;
use qc_08_consensus::{
    ConsensusConfig, NoSpeculation, QueueDependencies, ResultCommitter, TickReport,
    ValidationQueue,
};
use qc_13_catchup::{BlockStore, InMemoryBlockStore, InMemoryStateStore, StateStore};
use serde_json::json;
use shared_crypto::{hash_processing_result, seal_block, sha3_256, Ed25519KeyPair, Ed25519Verifier};
use shared_types::{
    HlcTimestamp, NodeId, PeerReport, PeerRole, ProcessingResult, StateDelta, StaticPeerDirectory,
    SubBlock, TxResult,
};
use std::sync::Arc;

/// Install a test log subscriber once (`RUST_LOG` controls the level).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Deterministic masternode key.
pub fn node_key(seed: u8) -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed([seed; 32])
}

/// Logical timestamp for round `n`.
pub fn hlc(n: u64) -> HlcTimestamp {
    HlcTimestamp::new(1_700_000_000_000_000_000 + n, 0)
}

/// Result of executing round `n`; `variant` models divergent execution.
pub fn execute(n: u64, variant: u32) -> ProcessingResult {
    ProcessingResult {
        hlc_timestamp: hlc(n),
        tx_result: TxResult {
            tx_hash: sha3_256(&n.to_be_bytes()),
            status: 0,
            payload: json!({"sender": "alice", "to": "bob", "amount": n}),
            state: vec![
                StateDelta {
                    key: "currency.balances:bob".to_string(),
                    value: json!(n * 10 + u64::from(variant)),
                },
                StateDelta {
                    key: "rounds".to_string(),
                    value: json!(n),
                },
            ],
        },
    }
}

/// Sign `payload` as `key`.
pub fn signed_report(key: &Ed25519KeyPair, payload: ProcessingResult) -> PeerReport {
    let result_hash = hash_processing_result(&payload).unwrap();
    PeerReport {
        hlc_timestamp: payload.hlc_timestamp,
        result_hash,
        proof: key.sign_result(&payload.hlc_timestamp, result_hash),
        full_payload: payload,
    }
}

/// Mints one block per committed result on top of the node's chain.
pub struct ChainCommitter {
    blocks: Arc<InMemoryBlockStore>,
    state: Arc<InMemoryStateStore>,
}

impl ChainCommitter {
    pub fn new(blocks: Arc<InMemoryBlockStore>, state: Arc<InMemoryStateStore>) -> Self {
        Self { blocks, state }
    }
}

#[async_trait]
impl ResultCommitter for ChainCommitter {
    async fn apply_processing_results(&self, result: &ProcessingResult) -> Result<(), String> {
        let number = self.blocks.latest_height() + 1;
        let subblock = SubBlock {
            input_hash: sha3_256(&result.hlc_timestamp.to_signing_bytes()),
            transactions: vec![result.tx_result.clone()],
            merkle_root: hash_processing_result(result).map_err(|e| e.to_string())?,
            signatures: vec![],
        };
        let block = seal_block(number, self.blocks.latest_hash(), vec![subblock])
            .map_err(|e| e.to_string())?;

        self.state
            .apply_state_deltas(number, &block.hash, &block.state_deltas())
            .map_err(|e| e.to_string())?;
        let hash = block.hash;
        self.blocks.put_block(block).map_err(|e| e.to_string())?;
        self.blocks
            .set_latest(number, hash)
            .map_err(|e| e.to_string())
    }
}

pub type NodeQueue =
    ValidationQueue<ChainCommitter, StaticPeerDirectory, Ed25519Verifier, NoSpeculation>;

/// One masternode.
pub struct TestNode {
    pub key: Ed25519KeyPair,
    pub queue: NodeQueue,
    pub blocks: Arc<InMemoryBlockStore>,
    pub state: Arc<InMemoryStateStore>,
}

impl TestNode {
    pub fn id(&self) -> NodeId {
        self.key.node_id()
    }

    pub fn height(&self) -> u64 {
        self.blocks.latest_height()
    }
}

/// Masternodes that all list each other.
pub struct TestNetwork {
    pub nodes: Vec<TestNode>,
}

impl TestNetwork {
    pub fn new(size: u8) -> Self {
        Self::with_config(size, ConsensusConfig::for_testing())
    }

    pub fn with_config(size: u8, config: ConsensusConfig) -> Self {
        let seeds: Vec<u8> = (1..=size).collect();
        let nodes = seeds
            .iter()
            .map(|&seed| {
                let key = node_key(seed);
                let peers = seeds
                    .iter()
                    .filter(|&&other| other != seed)
                    .map(|&other| node_key(other).node_id());
                let directory = Arc::new(StaticPeerDirectory::with_peers(
                    peers,
                    PeerRole::Masternode,
                ));
                let blocks = Arc::new(InMemoryBlockStore::new());
                let state = Arc::new(InMemoryStateStore::new());

                let queue = ValidationQueue::new(QueueDependencies {
                    committer: Arc::new(ChainCommitter::new(blocks.clone(), state.clone())),
                    directory,
                    verifier: Arc::new(Ed25519Verifier),
                    speculative: Arc::new(NoSpeculation),
                    local_node: key.node_id(),
                    config: config.clone(),
                })
                .unwrap();

                TestNode {
                    key,
                    queue,
                    blocks,
                    state,
                }
            })
            .collect();

        Self { nodes }
    }

    /// Node `from` executes `payload` and gossips its report to `to`
    /// (itself included when listed).
    pub async fn gossip(&mut self, from: usize, payload: ProcessingResult, to: &[usize]) {
        let report = signed_report(&self.nodes[from].key, payload);
        for &target in to {
            self.nodes[target].queue.append(report.clone()).await;
        }
    }

    /// Every node executes round `n` identically and gossips to everyone.
    pub async fn agree_on(&mut self, n: u64) {
        let everyone: Vec<usize> = (0..self.nodes.len()).collect();
        for from in 0..self.nodes.len() {
            self.gossip(from, execute(n, 0), &everyone).await;
        }
    }

    /// One tick on every node.
    pub async fn tick_all(&mut self) -> Vec<TickReport> {
        let mut reports = Vec::with_capacity(self.nodes.len());
        for node in &mut self.nodes {
            reports.push(node.queue.process_next().await.unwrap());
        }
        reports
    }
}
