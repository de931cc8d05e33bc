//! # Catchup Coordinator
//!
//! Brings a node that is behind up to the network height before it takes
//! part in consensus.
//!
//! ## Phases
//!
//! ```text
//! repair ──→ discover height ──→ fetch + verify block tip+1 ──→ ... ──→ drain gossip
//!   (D)          (A)                       (B)                           (C)
//!                 ↑                         │ no verifiable block
//!                 └──── retry_delay ────────┘
//! ```
//!
//! - **A**: every peer is asked for its height concurrently; the most-claimed
//!   height wins once enough peers agree.
//! - **B**: every peer is asked for the next block; the first one that
//!   verifies against the trusted tip is applied.
//! - **C**: gossip blocks that arrive meanwhile are queued and applied in
//!   order once the tip reaches them.
//! - **D**: before anything else, stored blocks the state has not applied
//!   are replayed locally.
//!
//! One unreachable or lying peer never aborts a pass. A pass with no quorum
//! or no verifiable block is retried after `retry_delay`.

use crate::algorithms::{
    classify_response, height_threshold, quorum_height, rejection_label, verify_candidate,
    BlockCandidate, SignaturePolicy,
};
use crate::config::CatchupConfig;
use crate::domain::{
    CatchupError, CatchupReport, CatchupResult, IntermediateQueue, RepairIssue, RepairReport,
    TrustedTip,
};
use crate::metrics;
use crate::ports::{
    BlockStore, CatchupApi, PeerDirectory, PeerNetwork, SignatureVerifier, StateStore,
};
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use shared_crypto::{validate_block, Ed25519Verifier};
use shared_types::{Block, CatchupRequest, CatchupResponse, HeightClaim, NodeId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::Instant;
use tracing::{debug, info, warn};


/// Collaborators for [`CatchupCoordinator`].
pub struct CatchupDependencies<N, B, S, D> {
    /// Peer RPC.
    pub network: Arc<N>,
    /// Block storage.
    pub blocks: Arc<B>,
    /// Application state.
    pub state: Arc<S>,
    /// Membership view.
    pub directory: Arc<D>,
    /// This node.
    pub local_node: NodeId,
    /// Configuration.
    pub config: CatchupConfig,
}

/// How one discover-and-fetch pass ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PassOutcome {
    /// Nobody to catch up from.
    NoPeers,
    /// Peers answered but no height reached the threshold.
    NoQuorum,
    /// Already at or above the quorum height.
    UpToDate,
    /// Synced to the quorum height.
    Reached,
    /// No peer produced a verifiable block for the next number.
    Stalled,
}

/// Result of asking every peer for one block.
struct BlockFetch {
    block: Option<Block>,
    rejected: u64,
}

/// Sequential, verified history sync.
pub struct CatchupCoordinator<N, B, S, D>
where
    N: PeerNetwork,
    B: BlockStore,
    S: StateStore,
    D: PeerDirectory,
{
    network: Arc<N>,
    blocks: Arc<B>,
    state: Arc<S>,
    directory: Arc<D>,
    local_node: NodeId,
    config: CatchupConfig,
    verifier: Arc<dyn SignatureVerifier>,
    gossip: Option<mpsc::UnboundedReceiver<Block>>,
    intermediate: IntermediateQueue,
    tip: TrustedTip,
    /// Highest quorum height seen so far.
    network_height: u64,
}

impl<N, B, S, D> CatchupCoordinator<N, B, S, D>
where
    N: PeerNetwork,
    B: BlockStore,
    S: StateStore,
    D: PeerDirectory,
{
    /// Validate the config and start from the stored chain head.
    pub fn new(deps: CatchupDependencies<N, B, S, D>) -> CatchupResult<Self> {
        deps.config.validate()?;

        let tip = TrustedTip::new(deps.blocks.latest_height(), deps.blocks.latest_hash());

        info!(
            "[qc-13] Catchup coordinator ready: node={}, stored height={}, confirmations={}",
            deps.local_node.short(),
            tip.number,
            deps.config.required_confirmations
        );

        Ok(Self {
            network: deps.network,
            blocks: deps.blocks,
            state: deps.state,
            directory: deps.directory,
            local_node: deps.local_node,
            config: deps.config,
            verifier: Arc::new(Ed25519Verifier),
            gossip: None,
            intermediate: IntermediateQueue::new(),
            tip,
            network_height: 0,
        })
    }

    /// Use a different sub-block signature check.
    pub fn with_signature_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Receive gossip blocks while catching up.
    pub fn with_gossip(mut self, gossip: mpsc::UnboundedReceiver<Block>) -> Self {
        self.gossip = Some(gossip);
        self
    }

    /// Last verified and applied block.
    pub fn trusted_tip(&self) -> TrustedTip {
        self.tip
    }

    /// Gossip blocks waiting in the intermediate queue.
    pub fn queued_blocks(&self) -> usize {
        self.intermediate.len()
    }

    /// Active configuration.
    pub fn config(&self) -> &CatchupConfig {
        &self.config
    }

    async fn peers(&self) -> Vec<NodeId> {
        self.directory
            .list_peers(self.config.peer_role)
            .await
            .into_iter()
            .filter(|peer| *peer != self.local_node)
            .collect()
    }

    fn signature_policy(&self) -> Option<SignaturePolicy<'_>> {
        self.config.verify_signatures.then(|| SignaturePolicy {
            verifier: self.verifier.as_ref(),
            min_valid: self.config.min_subblock_signatures,
        })
    }

    /// One request, bounded even if the network adapter ignores the timeout.
    async fn request(&self, peer: &NodeId, request: CatchupRequest) -> Option<CatchupResponse> {
        let timeout = self.config.peer_request_timeout();
        tokio::time::timeout(timeout, self.network.send_request(peer, request, timeout))
            .await
            .ok()
            .flatten()
    }

    async fn request_height(&self, peer: NodeId) -> (NodeId, Option<HeightClaim>) {
        for attempt in 0..=self.config.height_request_retries {
            match self.request(&peer, CatchupRequest::LatestHeight).await {
                Some(CatchupResponse::Height(claim)) => return (peer, Some(claim)),
                Some(_) => {
                    debug!("[qc-13] {} answered a height request with a block", peer.short());
                    return (peer, None);
                }
                None => debug!(
                    "[qc-13] No height from {} (attempt {})",
                    peer.short(),
                    attempt + 1
                ),
            }
        }
        (peer, None)
    }

    // =========================================================================
    // PHASE A: HEIGHT DISCOVERY
    // =========================================================================

    /// Height a quorum of peers agrees on.
    ///
    /// Claims are tallied as they arrive and the first height to reach the
    /// threshold is returned. Late peers are abandoned. `None` when there
    /// are no peers or no quorum forms before the discovery timeout.
    pub async fn discover_network_height(&self) -> Option<u64> {
        let peers = self.peers().await;
        if peers.is_empty() {
            debug!("[qc-13] No {:?} peers to ask for height", self.config.peer_role);
            return None;
        }

        let threshold = height_threshold(
            self.config.required_confirmations,
            peers.len(),
            self.config.local_node_votes,
        );
        let local_height = self.config.local_node_votes.then_some(self.tip.number);
        let deadline = Instant::now() + self.config.height_discovery_timeout();

        let mut pending: FuturesUnordered<_> =
            peers.iter().map(|peer| self.request_height(*peer)).collect();
        let mut claims: BTreeMap<NodeId, HeightClaim> = BTreeMap::new();

        loop {
            match tokio::time::timeout_at(deadline, pending.next()).await {
                Ok(Some((peer, Some(claim)))) => {
                    debug!("[qc-13] {} claims height {}", peer.short(), claim.height);
                    claims.insert(peer, claim);
                    if let Some(height) = quorum_height(&claims, local_height, threshold) {
                        info!(
                            "[qc-13] Network height {} ({} claims, threshold {})",
                            height,
                            claims.len(),
                            threshold
                        );
                        metrics::set_network_height(height);
                        return Some(height);
                    }
                }
                Ok(Some((_, None))) => {}
                Ok(None) => break,
                Err(_) => {
                    debug!("[qc-13] Height discovery timed out");
                    break;
                }
            }
        }

        warn!(
            "[qc-13] No height quorum: {} of {} peers answered, threshold {}",
            claims.len(),
            peers.len(),
            threshold
        );
        None
    }

    // =========================================================================
    // PHASE B: BLOCK FETCH AND VERIFY
    // =========================================================================

    /// Ask every peer for block `number`; keep the first that verifies.
    async fn fetch_verified_block(&self, number: u64, peers: &[NodeId]) -> BlockFetch {
        let trusted_previous = self.tip.hash;
        let policy = self.signature_policy();
        let mut rejected = 0;

        let mut pending: FuturesUnordered<_> = peers
            .iter()
            .map(|peer| async move {
                let response = self
                    .request(peer, CatchupRequest::GetBlock { number })
                    .await;
                (*peer, response)
            })
            .collect();

        while let Some((peer, response)) = pending.next().await {
            match classify_response(response, number, &trusted_previous, policy.as_ref()) {
                BlockCandidate::Verified(block) => {
                    debug!("[qc-13] Block {} verified from {}", number, peer.short());
                    return BlockFetch {
                        block: Some(block),
                        rejected,
                    };
                }
                BlockCandidate::Rejected(reason) => {
                    warn!(
                        "[qc-13] Discarding block {} from {}: {}",
                        number,
                        peer.short(),
                        reason
                    );
                    metrics::record_rejected(rejection_label(&reason));
                    rejected += 1;
                }
                BlockCandidate::Absent => {
                    debug!("[qc-13] {} has no block {}", peer.short(), number);
                }
            }
        }

        BlockFetch {
            block: None,
            rejected,
        }
    }

    /// Persist, apply state, move the stored head, advance the tip.
    fn apply_block(&mut self, block: Block, source: &str) -> CatchupResult<()> {
        let number = block.number;
        let hash = block.hash;
        let deltas = block.state_deltas();
        let tx_count = block.tx_count();
        let short_hash = block.short_hash();

        self.blocks.put_block(block)?;
        self.state.apply_state_deltas(number, &hash, &deltas)?;
        self.blocks.set_latest(number, hash)?;
        self.tip = TrustedTip::new(number, hash);

        metrics::record_block_applied(source);
        metrics::set_local_height(number);
        info!(
            "[qc-13] Applied block {} ({}, {} txs) from {}",
            number, short_hash, tx_count, source
        );
        Ok(())
    }

    async fn run_pass(&mut self, report: &mut CatchupReport) -> CatchupResult<PassOutcome> {
        self.absorb_gossip();

        let peers = self.peers().await;
        if peers.is_empty() {
            return Ok(PassOutcome::NoPeers);
        }

        let Some(target) = self.discover_network_height().await else {
            return Ok(PassOutcome::NoQuorum);
        };
        report.target_height = report.target_height.max(target);
        self.network_height = self.network_height.max(target);

        if target <= self.tip.number {
            debug!(
                "[qc-13] Tip {} already at network height {}",
                self.tip.number, target
            );
            return Ok(PassOutcome::UpToDate);
        }

        while self.tip.number < target {
            let number = self.tip.next_number();
            let fetch = self.fetch_verified_block(number, &peers).await;
            report.rejected_responses += fetch.rejected;

            match fetch.block {
                Some(block) => {
                    self.apply_block(block, "peer")?;
                    report.blocks_applied += 1;
                    self.absorb_gossip();
                }
                None => {
                    warn!(
                        "[qc-13] No peer produced a verifiable block {} ({} rejected)",
                        number, fetch.rejected
                    );
                    return Ok(PassOutcome::Stalled);
                }
            }
        }

        Ok(PassOutcome::Reached)
    }

    /// Self-repair, then sync to the quorum height and drain queued gossip.
    ///
    /// Retries indefinitely unless `max_passes` is set, in which case
    /// exhausting it returns [`CatchupError::Stalled`].
    pub async fn run(&mut self) -> CatchupResult<CatchupReport> {
        let repair = self.repair_chain_state()?;

        let mut report = CatchupReport {
            start_height: self.tip.number,
            target_height: self.tip.number,
            final_height: self.tip.number,
            repair,
            ..Default::default()
        };

        info!("[qc-13] Catchup started at height {}", self.tip.number);

        let mut last_progress = Instant::now();
        let mut stall_warned = false;

        loop {
            report.passes += 1;
            metrics::record_pass();

            let before = self.tip.number;
            let outcome = self.run_pass(&mut report).await?;
            if self.tip.number > before {
                last_progress = Instant::now();
                stall_warned = false;
            }

            match outcome {
                PassOutcome::NoPeers => {
                    info!("[qc-13] No peers to catch up from");
                    break;
                }
                PassOutcome::UpToDate | PassOutcome::Reached => break,
                PassOutcome::NoQuorum | PassOutcome::Stalled => {}
            }

            if self
                .config
                .max_passes
                .is_some_and(|max| report.passes >= max)
            {
                warn!(
                    "[qc-13] Giving up at height {} after {} passes",
                    self.tip.number, report.passes
                );
                metrics::record_stall();
                return Err(CatchupError::Stalled {
                    height: self.tip.number,
                    passes: report.passes,
                });
            }

            if !stall_warned && last_progress.elapsed() >= self.config.progress_timeout() {
                warn!(
                    "[qc-13] No catchup progress for {:?}: tip {}, network height {}",
                    last_progress.elapsed(),
                    self.tip.number,
                    report.target_height
                );
                metrics::record_stall();
                stall_warned = true;
            }

            tokio::time::sleep(self.config.retry_delay()).await;
        }

        report.gossip_applied = self.drain_intermediate()? as u64;
        report.final_height = self.tip.number;

        info!(
            "[qc-13] Catchup finished: {} -> {} ({} fetched, {} from gossip, {} passes)",
            report.start_height,
            report.final_height,
            report.blocks_applied,
            report.gossip_applied,
            report.passes
        );
        Ok(report)
    }

    // =========================================================================
    // PHASE C: INTERMEDIATE SYNC
    // =========================================================================

    /// Move everything waiting on the gossip channel into the queue.
    fn absorb_gossip(&mut self) {
        let Some(gossip) = self.gossip.as_mut() else {
            return;
        };

        let mut received = Vec::new();
        let mut closed = false;
        loop {
            match gossip.try_recv() {
                Ok(block) => received.push(block),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    closed = true;
                    break;
                }
            }
        }

        if closed {
            debug!("[qc-13] Gossip channel closed");
            self.gossip = None;
        }
        for block in received {
            self.hold_gossip(block);
        }
    }

    /// Queue a gossip block if it lies inside the gossip window.
    ///
    /// The window runs from just above the tip to `max_gossip_ahead` past
    /// the higher of the tip and the last discovered network height.
    fn hold_gossip(&mut self, block: Block) -> bool {
        let horizon = self
            .tip
            .number
            .max(self.network_height)
            .saturating_add(self.config.max_gossip_ahead);

        if block.number <= self.tip.number {
            debug!(
                "[qc-13] Ignoring gossip block {} at or below tip {}",
                block.number, self.tip.number
            );
            return false;
        }
        if block.number > horizon {
            debug!(
                "[qc-13] Ignoring gossip block {} beyond horizon {}",
                block.number, horizon
            );
            return false;
        }

        let number = block.number;
        let held = self.intermediate.push(block);
        if held {
            metrics::record_gossip_queued();
        } else {
            debug!("[qc-13] Not holding another candidate for block {}", number);
        }
        held
    }

    /// Apply queued blocks that extend the tip, in order.
    ///
    /// Candidates at or below the tip are dropped, non-verifying ones are
    /// discarded, and anything past a gap stays queued.
    fn drain_intermediate(&mut self) -> CatchupResult<usize> {
        self.absorb_gossip();

        let stale = self.intermediate.drop_through(self.tip.number);
        if stale > 0 {
            debug!("[qc-13] Dropped {} queued blocks at or below the tip", stale);
        }

        let mut applied = 0;
        while let Some(candidates) = self.intermediate.take(self.tip.next_number()) {
            let number = self.tip.next_number();
            let trusted_previous = self.tip.hash;

            let verified = {
                let policy = self.signature_policy();
                candidates.into_iter().find_map(|block| {
                    match verify_candidate(block, number, &trusted_previous, policy.as_ref()) {
                        BlockCandidate::Verified(block) => Some(block),
                        BlockCandidate::Rejected(reason) => {
                            warn!("[qc-13] Discarding gossip block {}: {}", number, reason);
                            metrics::record_rejected(rejection_label(&reason));
                            None
                        }
                        BlockCandidate::Absent => None,
                    }
                })
            };

            match verified {
                Some(block) => {
                    self.apply_block(block, "gossip")?;
                    applied += 1;
                }
                None => break,
            }
        }

        if !self.intermediate.is_empty() {
            debug!(
                "[qc-13] {} gossip blocks still queued past tip {}",
                self.intermediate.len(),
                self.tip.number
            );
        }
        Ok(applied)
    }

    /// Queue a gossip block and apply whatever now extends the tip.
    pub fn receive_block(&mut self, block: Block) -> CatchupResult<usize> {
        if !self.hold_gossip(block) {
            return Ok(0);
        }
        self.drain_intermediate()
    }

    // =========================================================================
    // PHASE D: SELF-REPAIR
    // =========================================================================

    /// Reconcile stored blocks with applied state, without the network.
    ///
    /// Stored blocks above the state height are re-verified and replayed in
    /// order. The first missing or invalid block ends the replay and the
    /// stored head is moved back to the last good block; catchup refetches
    /// the rest. State ahead of storage is only reported.
    pub fn repair_chain_state(&mut self) -> CatchupResult<RepairReport> {
        let stored_height = self.blocks.latest_height();
        let state_height = self.state.applied_height();

        let mut report = RepairReport {
            state_height_before: state_height,
            stored_height_before: stored_height,
            height_after: state_height.min(stored_height),
            ..RepairReport::new()
        };

        if state_height > stored_height {
            warn!(
                "[qc-13] State at {} is ahead of stored chain at {}; missing blocks will be refetched",
                state_height, stored_height
            );
            report.add_issue(RepairIssue::StateAhead {
                state_height,
                stored_height,
            });
            self.tip = TrustedTip::new(stored_height, self.blocks.latest_hash());
            return Ok(report);
        }

        if state_height == stored_height {
            if self.state.applied_hash() != self.blocks.latest_hash() {
                warn!(
                    "[qc-13] State and stored chain disagree on block {}",
                    stored_height
                );
                report.add_issue(RepairIssue::HashMismatch {
                    height: stored_height,
                });
            }
            self.tip = TrustedTip::new(stored_height, self.blocks.latest_hash());
            return Ok(report);
        }

        info!(
            "[qc-13] Replaying stored blocks {}..={} into state",
            state_height + 1,
            stored_height
        );

        let mut tip = TrustedTip::new(state_height, self.state.applied_hash());
        for number in state_height + 1..=stored_height {
            let Some(block) = self.blocks.get_block(number) else {
                warn!("[qc-13] Stored block {} is missing", number);
                report.add_issue(RepairIssue::MissingBlock { number });
                break;
            };

            if let Err(e) = validate_block(&block, number, &tip.hash) {
                warn!("[qc-13] Stored block {} failed verification: {}", number, e);
                report.add_issue(RepairIssue::InvalidBlock {
                    number,
                    reason: e.to_string(),
                });
                break;
            }

            if let Err(e) = self
                .state
                .apply_state_deltas(number, &block.hash, &block.state_deltas())
            {
                warn!("[qc-13] Replaying block {} failed: {}", number, e);
                report.add_issue(RepairIssue::StateWrite {
                    number,
                    reason: e.to_string(),
                });
                break;
            }

            tip.advance(&block);
            report.add_block(number, block.tx_count());
            metrics::record_block_applied("repair");
        }

        if tip.number < stored_height {
            warn!(
                "[qc-13] Truncating stored chain from {} to {}",
                stored_height, tip.number
            );
            self.blocks.set_latest(tip.number, tip.hash)?;
        }

        self.tip = tip;
        report.height_after = tip.number;
        metrics::set_local_height(tip.number);

        info!(
            "[qc-13] Self-repair replayed {} blocks ({} txs), height now {}",
            report.blocks_replayed, report.transactions_replayed, report.height_after
        );
        Ok(report)
    }
}

#[async_trait]
impl<N, B, S, D> CatchupApi for CatchupCoordinator<N, B, S, D>
where
    N: PeerNetwork,
    B: BlockStore,
    S: StateStore,
    D: PeerDirectory,
{
    async fn run(&mut self) -> CatchupResult<CatchupReport> {
        CatchupCoordinator::run(self).await
    }

    async fn discover_network_height(&self) -> Option<u64> {
        CatchupCoordinator::discover_network_height(self).await
    }

    fn repair_chain_state(&mut self) -> CatchupResult<RepairReport> {
        CatchupCoordinator::repair_chain_state(self)
    }

    fn receive_block(&mut self, block: Block) -> CatchupResult<usize> {
        CatchupCoordinator::receive_block(self, block)
    }

    fn trusted_tip(&self) -> TrustedTip {
        CatchupCoordinator::trusted_tip(self)
    }
}
