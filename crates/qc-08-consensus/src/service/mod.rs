//! # Validation Queue
//!
//! Admits peer result reports, drives repeated consensus evaluation and
//! commits agreed results strictly in timestamp order.
//!
//! ## Entry lifecycle
//!
//! ```text
//! append ──→ [PENDING] ──tick──→ [EVALUATING] ──verdict──→ [CONSENSUS REACHED]
//!                                     ↑                          │
//!                                     └──── vote changed ────────┤
//!                                                                │ earliest?
//!                                                                ↓
//!                                                          [COMMITTED] ──→ flushed
//! ```
//!
//! An entry that reaches consensus while an earlier timestamp is still
//! unresolved is held. Each commit retries the next earliest entry, so one
//! resolved predecessor can release a whole run of held entries.
//!
//! ## Rollback
//!
//! When the local node's own vote loses, its speculative state from that
//! timestamp onward was built on a divergent result. The queue rolls it back,
//! drops the local votes for every later timestamp, and then applies the
//! agreed payload.
//!
//! ## Concurrency
//!
//! The queue has a single owner. [`ValidationQueue::run`] multiplexes report
//! intake, ticks and shutdown with `tokio::select!`; the only parallelism is
//! inside the evaluator's worker pool.

use crate::config::ConsensusConfig;
use crate::domain::{
    ConsensusDeterminer, ConsensusError, ConsensusResult, EntryStage, LivenessMonitor,
    RejectReason, ReportOutcome, SolutionUpdate, TickReport, ValidationResultStore,
};
use crate::evaluator::{EvaluationJob, EvaluationOutcome, ParallelConsensusEvaluator};
use crate::metrics;
use crate::ports::{
    PeerDirectory, ResultCommitter, SignatureVerifier, SpeculativeState, ValidationQueueApi,
};
use async_trait::async_trait;
use shared_crypto::hash_processing_result;
use shared_types::{proof_signing_message, HlcTimestamp, NodeId, PeerReport, PeerRole};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};


/// Collaborators for [`ValidationQueue`].
pub struct QueueDependencies<C, D, V, S> {
    pub committer: Arc<C>,
    pub directory: Arc<D>,
    pub verifier: Arc<V>,
    pub speculative: Arc<S>,
    pub local_node: NodeId,
    pub config: ConsensusConfig,
}

/// Per-timestamp consensus and ordered commit.
pub struct ValidationQueue<C, D, V, S>
where
    C: ResultCommitter,
    D: PeerDirectory,
    V: SignatureVerifier,
    S: SpeculativeState,
{
    store: ValidationResultStore,
    evaluator: ParallelConsensusEvaluator,
    committer: Arc<C>,
    directory: Arc<D>,
    verifier: Arc<V>,
    speculative: Arc<S>,
    local_node: NodeId,
    config: ConsensusConfig,
    last_committed: Option<HlcTimestamp>,
    liveness: LivenessMonitor,
}

impl<C, D, V, S> ValidationQueue<C, D, V, S>
where
    C: ResultCommitter,
    D: PeerDirectory,
    V: SignatureVerifier,
    S: SpeculativeState,
{
    /// Validate the config and start the evaluator pool.
    pub fn new(deps: QueueDependencies<C, D, V, S>) -> ConsensusResult<Self> {
        deps.config.validate()?;

        let evaluator = ParallelConsensusEvaluator::new(
            deps.config.evaluator_threads,
            ConsensusDeterminer::new(deps.config.consensus_percent),
            deps.config.worker_poll_timeout(),
        )?;

        info!(
            "[qc-08] Validation queue ready: node={}, consensus={}%, workers={}",
            deps.local_node.short(),
            deps.config.consensus_percent,
            deps.config.evaluator_threads
        );

        Ok(Self {
            store: ValidationResultStore::new(),
            evaluator,
            committer: deps.committer,
            directory: deps.directory,
            verifier: deps.verifier,
            speculative: deps.speculative,
            local_node: deps.local_node,
            liveness: LivenessMonitor::new(deps.config.stall_ticks_warning),
            config: deps.config,
            last_committed: None,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_evaluator(mut self, evaluator: ParallelConsensusEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn local_node(&self) -> NodeId {
        self.local_node
    }

    pub fn store(&self) -> &ValidationResultStore {
        &self.store
    }

    /// Admit one peer report.
    ///
    /// Reports at or below the commit boundary are stale. Reports whose proof
    /// or payload does not line up with the claimed hash are rejected. The
    /// proof signer is the voter and must be an active masternode, or the
    /// local node when it votes.
    pub async fn append(&mut self, report: PeerReport) -> ReportOutcome {
        let hlc = report.hlc_timestamp;
        let peer = report.peer();

        if self.last_committed.is_some_and(|committed| hlc <= committed) {
            debug!("[qc-08] Stale report from {} for {}", peer.short(), hlc);
            metrics::record_report("stale");
            return ReportOutcome::Stale;
        }

        if let Err(reason) = self.check_report(&report).await {
            warn!(
                "[qc-08] Discarding report from {} for {}: {}",
                peer.short(),
                hlc,
                reason
            );
            metrics::record_report(reason.as_str());
            return ReportOutcome::Rejected(reason);
        }

        let update = self.store.add_solution(
            hlc,
            peer,
            report.result_hash,
            report.full_payload,
            report.proof,
        );

        let outcome = match update {
            SolutionUpdate::New => ReportOutcome::Accepted,
            SolutionUpdate::Duplicate => ReportOutcome::Duplicate,
            SolutionUpdate::Changed { previous } => {
                debug!(
                    "[qc-08] {} changed vote for {}: {} -> {}",
                    peer.short(),
                    hlc,
                    hex::encode(&previous[..4]),
                    hex::encode(&report.result_hash[..4])
                );
                self.store.update_for_node(&hlc, &peer);
                ReportOutcome::VoteChanged
            }
        };

        match &outcome {
            ReportOutcome::Accepted => metrics::record_report("accepted"),
            ReportOutcome::VoteChanged => metrics::record_report("vote_changed"),
            _ => metrics::record_report("duplicate"),
        }
        metrics::set_pending(self.store.len());
        outcome
    }

    async fn check_report(&self, report: &PeerReport) -> Result<(), RejectReason> {
        if report.proof.tx_result_hash != report.result_hash {
            return Err(RejectReason::ProofHashMismatch);
        }

        let message = proof_signing_message(&report.hlc_timestamp, &report.result_hash);
        if !self
            .verifier
            .verify(&report.proof.signer, &message, &report.proof.signature)
        {
            return Err(RejectReason::BadSignature);
        }

        let payload_hash = hash_processing_result(&report.full_payload)
            .map_err(|e| RejectReason::MalformedPayload(e.to_string()))?;
        if payload_hash != report.result_hash {
            return Err(RejectReason::PayloadHashMismatch);
        }

        if report.full_payload.hlc_timestamp != report.hlc_timestamp {
            return Err(RejectReason::PayloadTimestampMismatch);
        }

        if !self.active_voters().await.contains(&report.peer()) {
            return Err(RejectReason::UnknownPeer);
        }

        Ok(())
    }

    /// Who may vote right now: listed masternodes plus the local node when
    /// it votes.
    async fn active_voters(&self) -> BTreeSet<NodeId> {
        let mut voters: BTreeSet<NodeId> = self
            .directory
            .list_peers(PeerRole::Masternode)
            .await
            .into_iter()
            .collect();
        if self.config.local_node_votes {
            voters.insert(self.local_node);
        }
        voters
    }

    /// One tick: evaluate every unresolved entry, then commit the ready
    /// prefix.
    pub async fn process_next(&mut self) -> ConsensusResult<TickReport> {
        let mut report = TickReport::default();

        if self.store.unresolved().next().is_some() {
            // Votes of peers that left since admission no longer count.
            let voters = self.active_voters().await;
            let num_participants = voters.len();
            let jobs: Vec<EvaluationJob> = self
                .store
                .unresolved()
                .map(|(hlc, entry)| EvaluationJob {
                    hlc: *hlc,
                    solutions: entry
                        .solutions
                        .iter()
                        .filter(|(peer, _)| voters.contains(*peer))
                        .map(|(peer, hash)| (*peer, *hash))
                        .collect(),
                    last_check_info: entry.last_check_info,
                })
                .collect();
            let started = std::time::Instant::now();

            for outcome in self.evaluator.evaluate(jobs, num_participants).await {
                match outcome {
                    EvaluationOutcome::Verdict { hlc, result } => {
                        report.evaluated += 1;
                        self.store.set_check_result(&hlc, result);
                        if let (true, Some(kind)) = (result.has_consensus, result.consensus_type) {
                            debug!(
                                "[qc-08] {} consensus for {} among {} participants",
                                kind.as_str(),
                                hlc,
                                num_participants
                            );
                            metrics::record_consensus(kind.as_str());
                            report.reached.push(hlc);
                        }
                    }
                    EvaluationOutcome::TimedOut { .. } => {
                        report.timed_out += 1;
                        metrics::record_worker_timeout();
                    }
                }
            }
            metrics::record_evaluation_latency(started.elapsed().as_secs_f64());
        }

        self.commit_ready(&mut report).await?;

        report.held = self.store.len() - self.store.unresolved().count();

        if !report.committed.is_empty() || self.store.is_empty() {
            self.liveness.record_progress();
        } else if self.liveness.record_idle() {
            let earliest = self.store.earliest();
            warn!(
                "[qc-08] No commits for {} ticks; earliest pending {:?}, {} held behind it",
                self.config.stall_ticks_warning,
                earliest.map(|h| h.to_string()),
                report.held
            );
            report.stalled = true;
        }
        report.liveness = self.liveness.state();
        metrics::set_pending(self.store.len());

        Ok(report)
    }

    /// Commit while the earliest entry has consensus.
    async fn commit_ready(&mut self, report: &mut TickReport) -> ConsensusResult<()> {
        while let Some(hlc) = self.store.earliest() {
            if !self.store.hlc_has_consensus(&hlc) {
                break;
            }
            self.commit(hlc, report).await?;
        }
        Ok(())
    }

    async fn commit(&mut self, hlc: HlcTimestamp, report: &mut TickReport) -> ConsensusResult<()> {
        let winner = self
            .store
            .consensus_solution(&hlc)
            .ok_or(ConsensusError::MissingResult(hlc))?;
        let payload = self
            .store
            .get_consensus_results(&hlc)
            .cloned()
            .ok_or(ConsensusError::MissingResult(hlc))?;

        let local_vote = self.store.solution_of(&hlc, &self.local_node);
        if local_vote.is_some_and(|local| local != winner) {
            warn!(
                "[qc-08] Local result for {} lost to {}; rolling back speculative state",
                hlc,
                hex::encode(&winner[..4])
            );
            self.speculative
                .rollback_from(hlc)
                .await
                .map_err(|reason| ConsensusError::RollbackFailed { hlc, reason })?;
            let dropped = self.store.remove_peer_votes_after(&hlc, &self.local_node);
            debug!("[qc-08] Dropped {} local votes after {}", dropped, hlc);
            metrics::record_rollback();
            report.rollbacks.push(hlc);
        }

        if let Err(reason) = self.committer.apply_processing_results(&payload).await {
            error!("[qc-08] Failed to apply results for {}: {}", hlc, reason);
            return Err(ConsensusError::CommitFailed { hlc, reason });
        }

        self.last_committed = Some(hlc);
        self.store.flush(&hlc);
        report.committed.push(hlc);
        metrics::record_commit();
        info!("[qc-08] Committed {} ({})", hlc, hex::encode(&winner[..4]));
        Ok(())
    }

    pub fn last_committed(&self) -> Option<HlcTimestamp> {
        self.last_committed
    }

    pub fn pending_count(&self) -> usize {
        self.store.len()
    }

    pub fn stage(&self, hlc: &HlcTimestamp) -> Option<EntryStage> {
        if let Some(entry) = self.store.get(hlc) {
            return Some(if entry.last_check_info.has_consensus {
                EntryStage::ConsensusReached
            } else if entry.evaluations == 0 {
                EntryStage::Pending
            } else {
                EntryStage::Evaluating
            });
        }
        match self.last_committed {
            Some(committed) if *hlc <= committed => Some(EntryStage::Committed),
            _ => None,
        }
    }

    /// Drive the queue until shutdown.
    ///
    /// Reports are admitted between ticks. A closed report channel stops
    /// intake but ticks continue so queued work still commits. A failed
    /// commit or rollback is retried on the next tick and counts as an idle
    /// tick; the loop gives up with the last error once
    /// `stall_ticks_warning` ticks in a row have failed.
    pub async fn run(
        &mut self,
        mut reports: mpsc::Receiver<PeerReport>,
        mut shutdown: watch::Receiver<bool>,
    ) -> ConsensusResult<()> {
        let mut ticker = tokio::time::interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut intake_open = true;
        let mut failed_ticks: u64 = 0;

        info!("[qc-08] Validation loop started");

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("[qc-08] Shutdown signal received");
                        return Ok(());
                    }
                }

                received = reports.recv(), if intake_open => {
                    match received {
                        Some(report) => {
                            self.append(report).await;
                        }
                        None => {
                            debug!("[qc-08] Report channel closed");
                            intake_open = false;
                        }
                    }
                }

                _ = ticker.tick() => {
                    match self.process_next().await {
                        Ok(_) => failed_ticks = 0,
                        Err(e) => {
                            failed_ticks += 1;
                            self.liveness.record_idle();
                            if failed_ticks >= self.config.stall_ticks_warning {
                                error!(
                                    "[qc-08] Giving up after {} failed ticks: {}",
                                    failed_ticks, e
                                );
                                return Err(e);
                            }
                            warn!(
                                "[qc-08] Tick failed ({}/{}), retrying: {}",
                                failed_ticks, self.config.stall_ticks_warning, e
                            );
                        }
                    }
                }
            }
        }
    }
}

#[async_trait]
impl<C, D, V, S> ValidationQueueApi for ValidationQueue<C, D, V, S>
where
    C: ResultCommitter,
    D: PeerDirectory,
    V: SignatureVerifier,
    S: SpeculativeState,
{
    async fn append(&mut self, report: PeerReport) -> ReportOutcome {
        ValidationQueue::append(self, report).await
    }

    async fn process_next(&mut self) -> ConsensusResult<TickReport> {
        ValidationQueue::process_next(self).await
    }

    fn last_committed(&self) -> Option<HlcTimestamp> {
        ValidationQueue::last_committed(self)
    }

    fn pending_count(&self) -> usize {
        ValidationQueue::pending_count(self)
    }

    fn stage(&self, hlc: &HlcTimestamp) -> Option<EntryStage> {
        ValidationQueue::stage(self, hlc)
    }
}
