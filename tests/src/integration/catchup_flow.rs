//! # Catchup From Consensus Nodes
//!
//! A masternode network mints history through the validation queue; a
//! fresh node then syncs that history over the in-process network.

#[cfg(test)]
mod tests {
    use crate::integration::support::{init_tracing, node_key, TestNetwork};
    use qc_13_catchup::{
        BlockStore, CatchupConfig, CatchupCoordinator, CatchupDependencies, CatchupError,
        InMemoryBlockStore, InMemoryStateStore, InProcessNetwork, PeerBehaviour, StateStore,
    };
    use shared_types::{PeerRole, StaticPeerDirectory};
    use std::sync::Arc;

    type Joiner = CatchupCoordinator<
        InProcessNetwork,
        InMemoryBlockStore,
        InMemoryStateStore,
        StaticPeerDirectory,
    >;

    struct FreshNode {
        catchup: Joiner,
        network: Arc<InProcessNetwork>,
        blocks: Arc<InMemoryBlockStore>,
        state: Arc<InMemoryStateStore>,
    }

    /// Run `rounds` agreed rounds on a three-node network.
    async fn minted_network(rounds: u64) -> TestNetwork {
        let mut net = TestNetwork::new(3);
        for n in 1..=rounds {
            net.agree_on(n).await;
        }
        net.tick_all().await;
        for node in &net.nodes {
            assert_eq!(node.height(), rounds);
        }
        net
    }

    /// A new node that sees every masternode of `net` as a catchup peer.
    fn fresh_node(
        net: &TestNetwork,
        behaviours: &[PeerBehaviour],
        config: CatchupConfig,
    ) -> FreshNode {
        let network = Arc::new(InProcessNetwork::new());
        let directory = Arc::new(StaticPeerDirectory::new());
        for (node, behaviour) in net.nodes.iter().zip(behaviours) {
            network.add_peer(node.id(), node.blocks.clone(), *behaviour);
            directory.insert(node.id(), PeerRole::Masternode);
        }

        let blocks = Arc::new(InMemoryBlockStore::new());
        let state = Arc::new(InMemoryStateStore::new());
        let catchup = CatchupCoordinator::new(CatchupDependencies {
            network: network.clone(),
            blocks: blocks.clone(),
            state: state.clone(),
            directory,
            local_node: node_key(99).node_id(),
            config,
        })
        .unwrap();

        FreshNode {
            catchup,
            network,
            blocks,
            state,
        }
    }

    fn two_confirmations() -> CatchupConfig {
        CatchupConfig {
            required_confirmations: 2,
            ..CatchupConfig::for_testing()
        }
    }

    #[tokio::test]
    async fn test_fresh_node_reaches_network_state() {
        init_tracing();
        let net = minted_network(6).await;
        let mut joiner = fresh_node(&net, &[PeerBehaviour::Honest; 3], two_confirmations());

        let report = joiner.catchup.run().await.unwrap();

        assert_eq!(report.start_height, 0);
        assert_eq!(report.final_height, 6);
        assert_eq!(report.blocks_applied, 6);
        assert_eq!(joiner.blocks.latest_hash(), net.nodes[0].blocks.latest_hash());
        assert_eq!(joiner.state.applied_height(), 6);
        assert_eq!(joiner.state.snapshot(), net.nodes[0].state.snapshot());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_node_ignores_lying_peers() {
        let net = minted_network(4).await;
        let mut joiner = fresh_node(
            &net,
            &[
                PeerBehaviour::ClaimsHeight(1_000),
                PeerBehaviour::CorruptBlocks,
                PeerBehaviour::Honest,
            ],
            two_confirmations(),
        );

        let report = joiner.catchup.run().await.unwrap();

        assert_eq!(report.target_height, 4);
        assert_eq!(report.final_height, 4);
        assert_eq!(joiner.state.snapshot(), net.nodes[2].state.snapshot());
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_peers_down_stalls() {
        let net = minted_network(2).await;
        let mut joiner = fresh_node(&net, &[PeerBehaviour::Unreachable; 3], two_confirmations());

        let err = joiner.catchup.run().await.unwrap_err();
        assert!(matches!(err, CatchupError::Stalled { height: 0, .. }));
        assert!(joiner.network.requests_sent() >= 3);
    }

    #[tokio::test]
    async fn test_joiner_follows_gossip_after_catchup() {
        let mut net = minted_network(3).await;
        let mut joiner = fresh_node(&net, &[PeerBehaviour::Honest; 3], two_confirmations());
        joiner.catchup.run().await.unwrap();

        net.agree_on(4).await;
        net.tick_all().await;
        let minted = net.nodes[0].blocks.get_block(4).unwrap();

        assert_eq!(joiner.catchup.receive_block(minted).unwrap(), 1);
        assert_eq!(joiner.blocks.latest_height(), 4);
        assert_eq!(joiner.state.snapshot(), net.nodes[1].state.snapshot());
    }

    #[tokio::test]
    async fn test_restarted_node_repairs_before_syncing() {
        let net = minted_network(5).await;
        let joiner = fresh_node(&net, &[PeerBehaviour::Honest; 3], two_confirmations());

        // Crash leftovers: blocks 1-3 stored, state never applied.
        for number in 1..=3 {
            let block = net.nodes[0].blocks.get_block(number).unwrap();
            let hash = block.hash;
            joiner.blocks.put_block(block).unwrap();
            joiner.blocks.set_latest(number, hash).unwrap();
        }
        let mut restarted = fresh_node_with_stores(&net, &joiner);

        let report = restarted.run().await.unwrap();
        assert_eq!(report.repair.blocks_replayed, 3);
        assert_eq!(report.start_height, 3);
        assert_eq!(report.blocks_applied, 2);
        assert_eq!(joiner.state.snapshot(), net.nodes[0].state.snapshot());
    }

    /// A coordinator over `joiner`'s existing stores, as after a restart.
    fn fresh_node_with_stores(net: &TestNetwork, joiner: &FreshNode) -> Joiner {
        let directory = Arc::new(StaticPeerDirectory::with_peers(
            net.nodes.iter().map(|n| n.id()),
            PeerRole::Masternode,
        ));
        CatchupCoordinator::new(CatchupDependencies {
            network: joiner.network.clone(),
            blocks: joiner.blocks.clone(),
            state: joiner.state.clone(),
            directory,
            local_node: node_key(99).node_id(),
            config: two_confirmations(),
        })
        .unwrap()
    }
}
