//! # Shared Types Crate
//!
//! Types shared by the consensus (qc-08) and catchup (qc-13) subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type that crosses a subsystem boundary
//!   is defined here.
//! - **Decoded at the edge**: peer messages arrive as tagged enums
//!   ([`PeerMessage`]); nothing in the core inspects untyped maps.
//! - **No module state**: quorum counting is a pure value ([`Tally`]) built
//!   from an explicit set of reports.

pub mod entities;
pub mod errors;
pub mod membership;
pub mod messages;
pub mod tally;

pub use entities::*;
pub use errors::*;
pub use membership::{PeerDirectory, PeerRole, StaticPeerDirectory};
pub use messages::{CatchupRequest, CatchupResponse, PeerMessage};
pub use tally::Tally;
