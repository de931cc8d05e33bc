//! # Consensus To Block
//!
//! Reports gossiped between masternodes reach consensus on every node and
//! mint the same block everywhere.

#[cfg(test)]
mod tests {
    use crate::integration::support::{execute, hlc, init_tracing, signed_report, TestNetwork};
    use qc_08_consensus::{EntryStage, ReportOutcome};
    use qc_13_catchup::BlockStore;
    use shared_crypto::hash_processing_result;

    #[tokio::test]
    async fn test_two_of_three_mint_one_block() {
        init_tracing();
        // Third node is listed but silent this round.
        let mut net = TestNetwork::new(3);
        net.gossip(0, execute(1, 0), &[0, 1]).await;
        net.gossip(1, execute(1, 0), &[0, 1]).await;

        for i in [0, 1] {
            let tick = net.nodes[i].queue.process_next().await.unwrap();
            assert_eq!(tick.committed, vec![hlc(1)]);
            let result = net.nodes[i].queue.store().get(&hlc(1));
            assert!(result.is_none(), "committed entries are flushed");
        }

        assert_eq!(net.nodes[0].height(), 1);
        assert_eq!(net.nodes[1].height(), 1);
        assert_eq!(
            net.nodes[0].blocks.latest_hash(),
            net.nodes[1].blocks.latest_hash()
        );
        assert_eq!(net.nodes[2].height(), 0);
    }

    #[tokio::test]
    async fn test_commit_visible_in_stage() {
        let mut net = TestNetwork::new(3);
        net.gossip(0, execute(1, 0), &[0]).await;
        net.gossip(1, execute(1, 0), &[0]).await;

        let queue = &mut net.nodes[0].queue;
        let tick = queue.process_next().await.unwrap();
        assert_eq!(tick.reached, vec![hlc(1)]);
        assert_eq!(queue.stage(&hlc(1)), Some(EntryStage::Committed));
    }

    #[tokio::test]
    async fn test_three_way_split_settles_identically() {
        let mut net = TestNetwork::new(3);
        let everyone = [0, 1, 2];
        for (node, variant) in [(0, 0), (1, 1), (2, 2)] {
            net.gossip(node, execute(1, variant), &everyone).await;
        }

        let reports = net.tick_all().await;
        for report in &reports {
            assert_eq!(report.committed, vec![hlc(1)]);
        }

        // Failed tier: the smallest result hash wins on every node.
        let winner = (0..3)
            .map(|v| execute(1, v))
            .min_by_key(|p| hash_processing_result(p).unwrap())
            .unwrap();

        let hashes: Vec<_> = net.nodes.iter().map(|n| n.blocks.latest_hash()).collect();
        assert!(hashes.windows(2).all(|w| w[0] == w[1]));

        for node in &net.nodes {
            let block = node.blocks.get_block(1).unwrap();
            assert_eq!(block.subblocks()[0].transactions[0], winner.tx_result);
        }
    }

    #[tokio::test]
    async fn test_minority_node_adopts_majority_result() {
        let mut net = TestNetwork::new(3);
        let everyone = [0, 1, 2];
        net.gossip(0, execute(1, 0), &everyone).await;
        net.gossip(1, execute(1, 0), &everyone).await;
        net.gossip(2, execute(1, 7), &everyone).await;

        let reports = net.tick_all().await;

        assert!(reports[0].rollbacks.is_empty());
        assert_eq!(reports[2].rollbacks, vec![hlc(1)]);
        assert_eq!(
            net.nodes[2].blocks.latest_hash(),
            net.nodes[0].blocks.latest_hash()
        );
        assert_eq!(
            net.nodes[2].state.snapshot(),
            net.nodes[0].state.snapshot()
        );
    }

    #[tokio::test]
    async fn test_rounds_build_the_same_chain_in_any_arrival_order() {
        let mut net = TestNetwork::new(3);
        let rounds = 5u64;

        // Node 2 hears every round in reverse order.
        for n in 1..=rounds {
            for from in 0..3 {
                net.gossip(from, execute(n, 0), &[0, 1]).await;
            }
        }
        for n in (1..=rounds).rev() {
            for from in 0..3 {
                net.gossip(from, execute(n, 0), &[2]).await;
            }
        }

        let reports = net.tick_all().await;
        for report in &reports {
            assert_eq!(report.committed, (1..=rounds).map(hlc).collect::<Vec<_>>());
        }

        for node in &net.nodes {
            assert_eq!(node.height(), rounds);
            assert_eq!(node.queue.last_committed(), Some(hlc(rounds)));
            assert_eq!(node.queue.pending_count(), 0);
        }
        assert_eq!(
            net.nodes[0].blocks.latest_hash(),
            net.nodes[2].blocks.latest_hash()
        );
    }

    #[tokio::test]
    async fn test_stale_report_after_commit() {
        let mut net = TestNetwork::new(3);
        net.agree_on(1).await;
        net.tick_all().await;

        let late = signed_report(&net.nodes[1].key, execute(1, 0));
        assert_eq!(
            net.nodes[0].queue.append(late).await,
            ReportOutcome::Stale
        );
        assert_eq!(net.nodes[0].height(), 1);
    }
}
