//! Ports layer (Hexagonal Architecture)
//!
//! Membership (`PeerDirectory`) and signature checks (`SignatureVerifier`)
//! are shared ports, re-exported here so queue callers find every seam in
//! one place.

mod inbound;
mod outbound;

pub use inbound::*;
pub use outbound::*;
pub use shared_crypto::SignatureVerifier;
pub use shared_types::PeerDirectory;
