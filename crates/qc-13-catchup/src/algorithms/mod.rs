//! # Algorithms Module
//!
//! Pure decision functions used by the coordinator.
//!
//! - height_discovery: quorum over peer height claims
//! - block_fetch: classifying peer block responses against the trusted tip

pub mod block_fetch;
pub mod height_discovery;

pub use block_fetch::{
    classify_response, rejection_label, verify_candidate, BlockCandidate, SignaturePolicy,
};
pub use height_discovery::{height_threshold, quorum_height, tally_heights};
