//! # Parallel Consensus Evaluator
//!
//! Fans consensus evaluation for every unresolved timestamp out to a rayon
//! worker pool. Each job carries a snapshot of its votes and previous verdict;
//! each worker answers on its own oneshot channel. One deadline covers the
//! whole batch, and silence by the deadline is "no result this round".
//!
//! ```text
//! process_next ──jobs──→ [rayon pool: qc-08-eval-N] ──oneshot──→ verdicts
//!                              (snapshot in, verdict out)
//! ```
//!
//! A timestamp whose previous job is still running is not dispatched again
//! until that worker finishes.

use crate::domain::{ConsensusCheckResult, ConsensusDeterminer, ConsensusError, ConsensusResult};
use parking_lot::Mutex;
use shared_types::{Hash, HlcTimestamp, NodeId};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Snapshot handed to a worker.
#[derive(Clone, Debug)]
pub struct EvaluationJob {
    pub hlc: HlcTimestamp,
    pub solutions: BTreeMap<NodeId, Hash>,
    pub last_check_info: ConsensusCheckResult,
}

/// What came back for one job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvaluationOutcome {
    Verdict {
        hlc: HlcTimestamp,
        result: ConsensusCheckResult,
    },
    /// Worker did not answer within the poll window, or an earlier job for
    /// the same timestamp is still running; retried next tick.
    TimedOut { hlc: HlcTimestamp },
}

impl EvaluationOutcome {
    pub fn hlc(&self) -> HlcTimestamp {
        match self {
            EvaluationOutcome::Verdict { hlc, .. } | EvaluationOutcome::TimedOut { hlc } => *hlc,
        }
    }
}

pub struct ParallelConsensusEvaluator {
    pool: rayon::ThreadPool,
    determiner: ConsensusDeterminer,
    poll_timeout: Duration,
    /// Timestamps with a job still running in the pool.
    in_flight: Arc<Mutex<BTreeSet<HlcTimestamp>>>,
    worker_delay: Option<Duration>,
}

impl ParallelConsensusEvaluator {
    pub fn new(
        threads: usize,
        determiner: ConsensusDeterminer,
        poll_timeout: Duration,
    ) -> ConsensusResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("qc-08-eval-{}", i))
            .build()
            .map_err(|e| ConsensusError::WorkerPool(e.to_string()))?;

        debug!(
            "[qc-08] Evaluator pool started with {} workers, poll window {:?}",
            threads, poll_timeout
        );

        Ok(Self {
            pool,
            determiner,
            poll_timeout,
            in_flight: Arc::new(Mutex::new(BTreeSet::new())),
            worker_delay: None,
        })
    }

    /// Make every worker sleep before answering.
    #[cfg(test)]
    pub(crate) fn with_worker_delay(mut self, delay: Duration) -> Self {
        self.worker_delay = Some(delay);
        self
    }

    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Evaluate every job; outcomes come back in job order.
    pub async fn evaluate(
        &self,
        jobs: Vec<EvaluationJob>,
        num_participants: usize,
    ) -> Vec<EvaluationOutcome> {
        let deadline = Instant::now() + self.poll_timeout;
        let mut pending = Vec::with_capacity(jobs.len());

        for job in jobs {
            let hlc = job.hlc;
            if !self.in_flight.lock().insert(hlc) {
                trace!("[qc-08] Previous job for {} still running", hlc);
                pending.push((hlc, None));
                continue;
            }

            let (tx, rx) = oneshot::channel();
            let determiner = self.determiner;
            let delay = self.worker_delay;
            let in_flight = Arc::clone(&self.in_flight);

            self.pool.spawn(move || {
                if let Some(delay) = delay {
                    std::thread::sleep(delay);
                }
                let verdict =
                    determiner.determine(&job.solutions, num_participants, &job.last_check_info);
                in_flight.lock().remove(&hlc);
                // Receiver is gone if the poll window already closed.
                let _ = tx.send(verdict);
            });

            pending.push((hlc, Some(rx)));
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        for (hlc, rx) in pending {
            let verdict = match rx {
                Some(rx) => tokio::time::timeout_at(deadline, rx).await.ok().and_then(Result::ok),
                None => None,
            };
            match verdict {
                Some(result) => outcomes.push(EvaluationOutcome::Verdict { hlc, result }),
                None => {
                    trace!("[qc-08] No verdict for {} this round", hlc);
                    outcomes.push(EvaluationOutcome::TimedOut { hlc });
                }
            }
        }
        outcomes
    }
}
