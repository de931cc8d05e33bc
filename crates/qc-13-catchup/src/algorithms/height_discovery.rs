//! # Height Discovery
//!
//! The network height is the most-claimed height once enough peers agree on
//! it. Counting uses the same tally-and-threshold primitive as result
//! consensus, over raw heights instead of hashes.
//!
//! ```text
//! threshold = max(1, min(required_confirmations, peers - 1))
//!           + 1 if the local node votes
//! ```

use shared_types::{HeightClaim, NodeId, Tally};
use std::collections::BTreeMap;

/// Matching claims needed before a height is trusted.
pub fn height_threshold(required_confirmations: usize, peer_count: usize, local_votes: bool) -> usize {
    let capped = required_confirmations.min(peer_count.saturating_sub(1)).max(1);
    capped + usize::from(local_votes)
}

/// Tally peer claims, plus the local height when the local node votes.
pub fn tally_heights(claims: &BTreeMap<NodeId, HeightClaim>, local_height: Option<u64>) -> Tally<u64> {
    let mut tally: Tally<u64> = claims.values().map(|c| c.height).collect();
    if let Some(height) = local_height {
        tally.add(height);
    }
    tally
}

/// Quorum height, if one has formed.
pub fn quorum_height(
    claims: &BTreeMap<NodeId, HeightClaim>,
    local_height: Option<u64>,
    threshold: usize,
) -> Option<u64> {
    tally_heights(claims, local_height).confirmed(threshold).copied()
}
