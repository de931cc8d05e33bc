//! # Tally
//!
//! Counts identical reported values and answers quorum questions about them.
//!
//! The consensus determiner tallies result hashes, catchup tallies raw block
//! heights. Both use this one primitive, built from an explicit set of
//! reports, so there is no shared counter state anywhere.

use std::collections::BTreeMap;

/// Occurrence counts of reported values.
///
/// Backed by an ordered map so that every query is deterministic: when
/// several values tie for the top count, the smallest value (by `Ord`) wins.
/// For 32-byte hashes that is the numerically smallest hash read as a
/// big-endian base-16 integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally<T: Ord + Clone> {
    counts: BTreeMap<T, usize>,
    total: usize,
}

impl<T: Ord + Clone> Default for Tally<T> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
            total: 0,
        }
    }
}

impl<T: Ord + Clone> Tally<T> {
    /// Create an empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one report of `value`.
    pub fn add(&mut self, value: T) {
        *self.counts.entry(value).or_insert(0) += 1;
        self.total += 1;
    }

    /// Number of reports recorded.
    pub fn total(&self) -> usize {
        self.total
    }

    /// How many times `value` was reported.
    pub fn count(&self, value: &T) -> usize {
        self.counts.get(value).copied().unwrap_or(0)
    }

    /// Highest count of any single value (0 when empty).
    pub fn top_count(&self) -> usize {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// All values sharing the top count, smallest first.
    pub fn top_items(&self) -> Vec<&T> {
        let top = self.top_count();
        if top == 0 {
            return Vec::new();
        }
        self.counts
            .iter()
            .filter(|(_, c)| **c == top)
            .map(|(v, _)| v)
            .collect()
    }

    /// The most-reported value; ties resolve to the smallest value.
    pub fn top_item(&self) -> Option<&T> {
        self.top_items().into_iter().next()
    }

    /// Count of the best value other than [`Tally::top_item`].
    ///
    /// Equals `top_count()` when the top is tied.
    pub fn runner_up_count(&self) -> usize {
        let top = match self.top_item() {
            Some(top) => top,
            None => return 0,
        };
        self.counts
            .iter()
            .filter(|(v, _)| *v != top)
            .map(|(_, c)| *c)
            .max()
            .unwrap_or(0)
    }

    /// The top value if it was reported at least `threshold` times.
    ///
    /// A zero threshold never confirms anything.
    pub fn confirmed(&self, threshold: usize) -> Option<&T> {
        if threshold == 0 {
            return None;
        }
        self.top_item().filter(|v| self.count(v) >= threshold)
    }
}

impl<T: Ord + Clone> FromIterator<T> for Tally<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tally = Tally::new();
        for value in iter {
            tally.add(value);
        }
        tally
    }
}
