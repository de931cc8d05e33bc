//! # QC-13 Chain Catchup
//!
//! Brings a lagging or freshly started node up to the network's agreed
//! history before it participates in consensus.
//!
//! **Subsystem ID:** 13
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Safety Properties
//!
//! | Defense | Description |
//! |---------|-------------|
//! | Height quorum | A height is trusted only once enough peers claim it |
//! | Chained verification | Every block must extend the trusted tip and hash to its content |
//! | First-verified-wins | Lying or corrupt peers are outvoted by any honest one |
//! | Self-repair | Crash leftovers are replayed from local storage first |
//!
//! ## Module Structure
//!
//! ```text
//! qc-13-catchup/
//! ├── domain/          # TrustedTip, reports, intermediate queue, errors
//! ├── algorithms/      # Height quorum, block response classification
//! ├── ports/           # CatchupApi (inbound) + network/storage traits (outbound)
//! ├── application/     # CatchupCoordinator, request responder
//! ├── adapters/        # In-memory stores, in-process network
//! └── config.rs        # CatchupConfig
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qc_13_catchup::{CatchupConfig, CatchupCoordinator, CatchupDependencies};
//!
//! let mut catchup = CatchupCoordinator::new(CatchupDependencies {
//!     network,
//!     blocks,
//!     state,
//!     directory,
//!     local_node,
//!     config: CatchupConfig::default(),
//! })?
//! .with_gossip(gossip_rx);
//!
//! let report = catchup.run().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
#[allow(missing_docs)]
pub mod metrics;
pub mod ports;

// Re-exports
pub use adapters::{InMemoryBlockStore, InMemoryStateStore, InProcessNetwork, PeerBehaviour};
pub use algorithms::{
    classify_response, height_threshold, quorum_height, tally_heights, verify_candidate,
    BlockCandidate, SignaturePolicy,
};
pub use application::{answer_request, CatchupCoordinator, CatchupDependencies};
pub use config::CatchupConfig;
pub use domain::{
    CatchupError, CatchupReport, CatchupResult, IntermediateQueue, RepairIssue, RepairReport,
    TrustedTip, DEFAULT_CONFIRMATIONS,
};
pub use ports::{BlockStore, CatchupApi, PeerNetwork, StateStore};
