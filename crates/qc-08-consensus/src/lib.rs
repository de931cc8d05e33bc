//! # qc-08-consensus
//!
//! Result validation queue for Quantum-Chain.
//!
//! ## Architecture
//!
//! Every unit of work is identified by a hybrid logical clock timestamp.
//! Peers execute it independently and report a signed result hash plus the
//! full payload. The queue decides, per timestamp, which result the network
//! agrees on and applies agreed results in timestamp order.
//!
//! ```text
//! PeerReport ──append──→ [ValidationResultStore]
//!                                │ unresolved snapshots
//!                                ↓
//!                  [ParallelConsensusEvaluator] ── rayon workers
//!                                │ verdicts (ideal / eager / failed)
//!                                ↓
//!                  commit earliest ──→ ResultCommitter
//! ```
//!
//! ### Consensus tiers
//!
//! - **Ideal**: `ceil(n * percent / 100)` identical results.
//! - **Eager**: the leader cannot be overtaken by the votes still missing.
//! - **Failed**: every tier foreclosed; the smallest tied hash wins so all
//!   honest nodes settle on the same result without another round.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qc_08_consensus::{ConsensusConfig, QueueDependencies, ValidationQueue};
//!
//! let mut queue = ValidationQueue::new(QueueDependencies {
//!     committer,
//!     directory,
//!     verifier: Arc::new(Ed25519Verifier),
//!     speculative: Arc::new(NoSpeculation),
//!     local_node,
//!     config: ConsensusConfig::default(),
//! })?;
//!
//! queue.run(reports_rx, shutdown_rx).await?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod evaluator;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-export main types
pub use adapters::{RecordingCommitter, RecordingSpeculativeState};
pub use config::{ConsensusConfig, DEFAULT_CONSENSUS_PERCENT};
pub use domain::{
    check_eager_consensus, check_failed_consensus, check_ideal_consensus, consensus_needed,
    determine_consensus, tally_solutions, ConsensusCheckResult, ConsensusDeterminer,
    ConsensusError, ConsensusResult, ConsensusType, EntryStage, LivenessMonitor, LivenessState,
    RejectReason, ReportOutcome, SolutionUpdate, TickReport, ValidationResult,
    ValidationResultStore,
};
pub use evaluator::{EvaluationJob, EvaluationOutcome, ParallelConsensusEvaluator};
pub use ports::{NoSpeculation, ResultCommitter, SpeculativeState, ValidationQueueApi};
pub use service::{QueueDependencies, ValidationQueue};
