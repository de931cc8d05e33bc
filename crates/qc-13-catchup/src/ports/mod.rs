//! Ports layer (Hexagonal Architecture)
//!
//! The coordinator talks to peers through [`PeerNetwork`], persists through
//! [`BlockStore`] and [`StateStore`], and learns membership through the
//! shared [`PeerDirectory`].

mod inbound;
mod outbound;

pub use inbound::*;
pub use outbound::*;
pub use shared_crypto::SignatureVerifier;
pub use shared_types::PeerDirectory;
