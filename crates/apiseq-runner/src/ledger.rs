//! Per-library coverage ledger
//!
//! The ledger records every branch ever credited to an accepted candidate
//! for one library, with cumulative hit counts. It is append-only:
//! superseding a candidate removes it from the corpus but never removes
//! its branches from the ledger, so the distinct-branch count is
//! monotonically non-decreasing over a run.
//!
//! Branch id spaces are namespaced per library; one ledger never sees
//! another library's ids.

use std::collections::{BTreeMap, BTreeSet};

/// Append-only record of branches credited to the corpus
#[derive(Debug, Clone, Default)]
pub struct CoverageLedger {
    hits: BTreeMap<String, u64>,
}

/// Immutable view of a ledger at one point in time.
///
/// Scoring reads a snapshot so one candidate's evaluation observes a
/// consistent state even while the selector commits between candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSnapshot {
    seen: BTreeSet<String>,
}

impl LedgerSnapshot {
    /// Whether a branch was already credited when the snapshot was taken
    #[must_use]
    pub fn contains(&self, branch: &str) -> bool {
        self.seen.contains(branch)
    }

    /// Branches in `exercised` not credited at snapshot time
    #[must_use]
    pub fn newly_seen(&self, exercised: &BTreeSet<String>) -> BTreeSet<String> {
        exercised.difference(&self.seen).cloned().collect()
    }

    /// Number of distinct branches credited at snapshot time
    #[must_use]
    pub fn unique_branches(&self) -> usize {
        self.seen.len()
    }
}

impl CoverageLedger {
    /// Create an empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take an immutable snapshot of the branches credited so far
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            seen: self.hits.keys().cloned().collect(),
        }
    }

    /// Credit a set of branch hits to the ledger.
    ///
    /// The sole mutator. Increments the hit count of every id in
    /// `branch_hits` and returns the subset that had no prior hits; that
    /// return value is the single source of truth for uniqueness.
    pub fn commit(&mut self, branch_hits: &BTreeSet<String>) -> BTreeSet<String> {
        let mut newly_seen = BTreeSet::new();
        for branch in branch_hits {
            let count = self.hits.entry(branch.clone()).or_insert(0);
            if *count == 0 {
                newly_seen.insert(branch.clone());
            }
            *count += 1;
        }
        newly_seen
    }

    /// Number of distinct branches ever credited
    #[must_use]
    pub fn unique_branches(&self) -> usize {
        self.hits.len()
    }

    /// Sum of all hit counts
    #[must_use]
    pub fn total_hits(&self) -> u64 {
        self.hits.values().sum()
    }

    /// Hit count for one branch
    #[must_use]
    pub fn hit_count(&self, branch: &str) -> u64 {
        self.hits.get(branch).copied().unwrap_or(0)
    }
}
