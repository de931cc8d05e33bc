//! Validation result bookkeeping
//!
//! One [`ValidationResult`] per logical timestamp: who voted for what, the
//! payload behind every hash still in play, and the latest verdict. Entries
//! live in an ordered map so the earliest pending timestamp is a
//! `first_key_value` away.

use super::ConsensusCheckResult;
use shared_types::{Hash, HlcTimestamp, NodeId, ProcessingResult, ResultProof};
use std::collections::{BTreeMap, HashMap};

/// Votes and verdict for one timestamp.
#[derive(Clone, Debug, Default)]
pub struct ValidationResult {
    /// peer -> result hash
    pub solutions: BTreeMap<NodeId, Hash>,
    /// peer -> signed proof
    pub proofs: BTreeMap<NodeId, ResultProof>,
    /// result hash -> full payload (first writer wins)
    pub result_lookup: HashMap<Hash, ProcessingResult>,
    /// Latest verdict, replaced wholesale on each evaluation.
    pub last_check_info: ConsensusCheckResult,
    /// Evaluations run since the entry was created or last reset.
    pub evaluations: u32,
}

impl ValidationResult {
    /// Drop payloads no current vote references.
    fn prune_lookup(&mut self) {
        let solutions = &self.solutions;
        self.result_lookup
            .retain(|hash, _| solutions.values().any(|h| h == hash));
    }

    fn reset_check(&mut self) {
        self.last_check_info = ConsensusCheckResult::initial();
        self.evaluations = 0;
    }
}

/// What recording a vote changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolutionUpdate {
    /// First vote from this peer for this timestamp.
    New,
    /// Same peer, same hash.
    Duplicate,
    /// Same peer, different hash.
    Changed { previous: Hash },
}

/// Per-timestamp vote store.
#[derive(Debug, Default)]
pub struct ValidationResultStore {
    entries: BTreeMap<HlcTimestamp, ValidationResult>,
}

impl ValidationResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty entry; returns false if one already existed.
    pub fn add(&mut self, hlc: HlcTimestamp) -> bool {
        if self.entries.contains_key(&hlc) {
            return false;
        }
        self.entries.insert(hlc, ValidationResult::default());
        true
    }

    /// Record `peer`'s vote.
    ///
    /// The payload is stored under `result_hash` only if no payload for that
    /// hash exists yet.
    pub fn add_solution(
        &mut self,
        hlc: HlcTimestamp,
        peer: NodeId,
        result_hash: Hash,
        payload: ProcessingResult,
        proof: ResultProof,
    ) -> SolutionUpdate {
        let entry = self.entries.entry(hlc).or_default();

        let update = match entry.solutions.insert(peer, result_hash) {
            None => SolutionUpdate::New,
            Some(previous) if previous == result_hash => SolutionUpdate::Duplicate,
            Some(previous) => SolutionUpdate::Changed { previous },
        };

        entry.proofs.insert(peer, proof);
        entry.result_lookup.entry(result_hash).or_insert(payload);
        update
    }

    /// Reopen consensus after `peer` changed its vote.
    ///
    /// Only acts if `peer` has a vote recorded: the verdict is reset so every
    /// tier is possible again, and payloads nothing votes for are pruned.
    pub fn update_for_node(&mut self, hlc: &HlcTimestamp, peer: &NodeId) -> bool {
        match self.entries.get_mut(hlc) {
            Some(entry) if entry.solutions.contains_key(peer) => {
                entry.reset_check();
                entry.prune_lookup();
                true
            }
            _ => false,
        }
    }

    /// Replace the verdict for `hlc`.
    pub fn set_check_result(&mut self, hlc: &HlcTimestamp, result: ConsensusCheckResult) -> bool {
        match self.entries.get_mut(hlc) {
            Some(entry) => {
                entry.last_check_info = result;
                entry.evaluations = entry.evaluations.saturating_add(1);
                true
            }
            None => false,
        }
    }

    pub fn hlc_has_consensus(&self, hlc: &HlcTimestamp) -> bool {
        self.entries
            .get(hlc)
            .map(|e| e.last_check_info.has_consensus)
            .unwrap_or(false)
    }

    /// Winning hash, if consensus was reached.
    pub fn consensus_solution(&self, hlc: &HlcTimestamp) -> Option<Hash> {
        self.entries
            .get(hlc)
            .filter(|e| e.last_check_info.has_consensus)
            .and_then(|e| e.last_check_info.solution)
    }

    /// Payload behind the winning hash.
    pub fn get_consensus_results(&self, hlc: &HlcTimestamp) -> Option<&ProcessingResult> {
        let solution = self.consensus_solution(hlc)?;
        self.entries.get(hlc)?.result_lookup.get(&solution)
    }

    /// `peer`'s current vote for `hlc`.
    pub fn solution_of(&self, hlc: &HlcTimestamp, peer: &NodeId) -> Option<Hash> {
        self.entries.get(hlc)?.solutions.get(peer).copied()
    }

    pub fn get(&self, hlc: &HlcTimestamp) -> Option<&ValidationResult> {
        self.entries.get(hlc)
    }

    /// Remove a committed entry.
    pub fn flush(&mut self, hlc: &HlcTimestamp) -> Option<ValidationResult> {
        self.entries.remove(hlc)
    }

    /// Whether `hlc` is the earliest timestamp present.
    pub fn is_earliest(&self, hlc: &HlcTimestamp) -> bool {
        self.earliest().as_ref() == Some(hlc)
    }

    pub fn earliest(&self) -> Option<HlcTimestamp> {
        self.entries.first_key_value().map(|(k, _)| *k)
    }

    /// Drop `peer`'s votes for every timestamp strictly after `hlc`.
    ///
    /// Touched entries reopen consensus; entries left without any vote are
    /// removed so they cannot block commit ordering.
    pub fn remove_peer_votes_after(&mut self, hlc: &HlcTimestamp, peer: &NodeId) -> usize {
        let mut removed = 0;
        let mut emptied = Vec::new();

        for (ts, entry) in self.entries.range_mut(hlc..) {
            if ts == hlc {
                continue;
            }
            if entry.solutions.remove(peer).is_some() {
                entry.proofs.remove(peer);
                entry.reset_check();
                entry.prune_lookup();
                removed += 1;
                if entry.solutions.is_empty() {
                    emptied.push(*ts);
                }
            }
        }

        for ts in emptied {
            self.entries.remove(&ts);
        }
        removed
    }

    /// Entries without consensus, in timestamp order.
    pub fn unresolved(&self) -> impl Iterator<Item = (&HlcTimestamp, &ValidationResult)> {
        self.entries
            .iter()
            .filter(|(_, e)| !e.last_check_info.has_consensus)
    }

    pub fn contains(&self, hlc: &HlcTimestamp) -> bool {
        self.entries.contains_key(hlc)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = &HlcTimestamp> {
        self.entries.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConsensusType;
    use shared_types::TxResult;

    fn hlc(n: u64) -> HlcTimestamp {
        HlcTimestamp::new(n, 0)
    }

    fn peer(i: u8) -> NodeId {
        NodeId([i; 32])
    }

    fn payload(n: u64, marker: u32) -> ProcessingResult {
        ProcessingResult {
            hlc_timestamp: hlc(n),
            tx_result: TxResult {
                tx_hash: [0u8; 32],
                status: marker,
                payload: serde_json::Value::Null,
                state: vec![],
            },
        }
    }

    fn proof(i: u8, hash: Hash) -> ResultProof {
        ResultProof {
            signer: peer(i),
            signature: [0u8; 64],
            tx_result_hash: hash,
        }
    }

    fn vote(store: &mut ValidationResultStore, n: u64, p: u8, h: u8) -> SolutionUpdate {
        store.add_solution(hlc(n), peer(p), [h; 32], payload(n, h as u32), proof(p, [h; 32]))
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut store = ValidationResultStore::new();
        assert!(store.add(hlc(1)));
        assert!(!store.add(hlc(1)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_first_writer_wins_per_hash() {
        let mut store = ValidationResultStore::new();
        store.add_solution(hlc(1), peer(1), [9u8; 32], payload(1, 100), proof(1, [9u8; 32]));
        store.add_solution(hlc(1), peer(2), [9u8; 32], payload(1, 200), proof(2, [9u8; 32]));

        let entry = store.get(&hlc(1)).unwrap();
        assert_eq!(entry.result_lookup.len(), 1);
        assert_eq!(entry.result_lookup[&[9u8; 32]].tx_result.status, 100);
        assert_eq!(entry.proofs.len(), 2);
    }

    #[test]
    fn test_solution_update_kinds() {
        let mut store = ValidationResultStore::new();
        assert_eq!(vote(&mut store, 1, 1, 5), SolutionUpdate::New);
        assert_eq!(vote(&mut store, 1, 1, 5), SolutionUpdate::Duplicate);
        assert_eq!(
            vote(&mut store, 1, 1, 6),
            SolutionUpdate::Changed { previous: [5u8; 32] }
        );
    }

    #[test]
    fn test_update_for_node_resets_and_prunes() {
        let mut store = ValidationResultStore::new();
        vote(&mut store, 1, 1, 5);
        vote(&mut store, 1, 2, 5);
        store.set_check_result(
            &hlc(1),
            ConsensusCheckResult::reached(ConsensusType::Failed, [5u8; 32], false, false),
        );
        assert!(store.hlc_has_consensus(&hlc(1)));

        // Peer 1 changes vote; 5 is still referenced by peer 2.
        vote(&mut store, 1, 1, 6);
        assert!(store.update_for_node(&hlc(1), &peer(1)));

        let entry = store.get(&hlc(1)).unwrap();
        assert!(entry.last_check_info.ideal_possible);
        assert!(entry.last_check_info.eager_possible);
        assert!(!entry.last_check_info.has_consensus);
        assert_eq!(entry.result_lookup.len(), 2);

        // Peer 2 moves too; 5 is now orphaned.
        vote(&mut store, 1, 2, 6);
        store.update_for_node(&hlc(1), &peer(2));
        let entry = store.get(&hlc(1)).unwrap();
        assert_eq!(entry.result_lookup.len(), 1);
        assert!(entry.result_lookup.contains_key(&[6u8; 32]));
    }

    #[test]
    fn test_update_for_unknown_node_is_noop() {
        let mut store = ValidationResultStore::new();
        vote(&mut store, 1, 1, 5);
        assert!(!store.update_for_node(&hlc(1), &peer(9)));
        assert!(!store.update_for_node(&hlc(2), &peer(1)));
    }

    #[test]
    fn test_consensus_results_follow_winner() {
        let mut store = ValidationResultStore::new();
        vote(&mut store, 1, 1, 5);
        vote(&mut store, 1, 2, 6);
        assert!(store.get_consensus_results(&hlc(1)).is_none());

        store.set_check_result(
            &hlc(1),
            ConsensusCheckResult::reached(ConsensusType::Ideal, [6u8; 32], true, true),
        );
        assert_eq!(store.get_consensus_results(&hlc(1)).unwrap().tx_result.status, 6);
        assert_eq!(store.consensus_solution(&hlc(1)), Some([6u8; 32]));
    }

    #[test]
    fn test_earliest_and_flush() {
        let mut store = ValidationResultStore::new();
        vote(&mut store, 30, 1, 1);
        vote(&mut store, 10, 1, 1);
        vote(&mut store, 20, 1, 1);

        assert!(store.is_earliest(&hlc(10)));
        assert!(!store.is_earliest(&hlc(20)));

        store.flush(&hlc(10));
        assert!(store.is_earliest(&hlc(20)));
        assert!(store.flush(&hlc(20)).is_some());
        assert!(store.flush(&hlc(20)).is_none());
        assert_eq!(store.earliest(), Some(hlc(30)));
    }

    #[test]
    fn test_remove_peer_votes_after() {
        let mut store = ValidationResultStore::new();
        vote(&mut store, 1, 0, 1);
        vote(&mut store, 2, 0, 1);
        vote(&mut store, 2, 1, 1);
        vote(&mut store, 3, 0, 1);

        // Votes strictly after hlc(1); hlc(3) had only our vote and goes away.
        assert_eq!(store.remove_peer_votes_after(&hlc(1), &peer(0)), 2);
        assert_eq!(store.solution_of(&hlc(1), &peer(0)), Some([1u8; 32]));
        assert_eq!(store.solution_of(&hlc(2), &peer(0)), None);
        assert_eq!(store.solution_of(&hlc(2), &peer(1)), Some([1u8; 32]));
        assert!(!store.contains(&hlc(3)));
    }

    #[test]
    fn test_unresolved_excludes_decided() {
        let mut store = ValidationResultStore::new();
        vote(&mut store, 1, 1, 1);
        vote(&mut store, 2, 1, 1);
        store.set_check_result(
            &hlc(1),
            ConsensusCheckResult::reached(ConsensusType::Ideal, [1u8; 32], true, true),
        );
        let pending: Vec<_> = store.unresolved().map(|(ts, _)| *ts).collect();
        assert_eq!(pending, vec![hlc(2)]);
    }
}
