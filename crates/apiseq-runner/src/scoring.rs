//! Candidate scoring
//!
//! Pure, deterministic scoring of a candidate against a ledger snapshot:
//!
//! ```text
//! value = 2.0 * |newly_seen| + density + critical_bonus
//! ```
//!
//! where `density` is branches hit per call made and `critical_bonus` is
//! a fixed 1.0 for exercising at least one designated critical call.
//! New coverage dominates the formula: one genuinely new branch outweighs
//! any density difference between typical sequences.

use crate::ledger::LedgerSnapshot;
use apiseq_gen::{CandidateRecord, ScoreResult};

/// Weight on newly seen branches
pub const NEW_BRANCH_WEIGHT: f64 = 2.0;
/// Fixed bonus for exercising at least one critical call
pub const CRITICAL_BONUS: f64 = 1.0;

/// Pure scoring function over ledger snapshots
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    /// Create a scoring engine
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Score a candidate against a ledger snapshot.
    ///
    /// No side effects; calling twice with the same snapshot returns
    /// identical results. A candidate with an empty exercised set scores
    /// only its critical bonus.
    #[must_use]
    pub fn score(&self, candidate: &CandidateRecord, snapshot: &LedgerSnapshot) -> ScoreResult {
        let exercised = candidate.exercised();
        let newly_seen = snapshot.newly_seen(exercised).len();
        let density = candidate.quality.recomputed_density();
        let critical_bonus = if candidate.quality.critical_calls.is_empty() {
            0.0
        } else {
            CRITICAL_BONUS
        };
        ScoreResult {
            value: NEW_BRANCH_WEIGHT * newly_seen as f64 + density + critical_bonus,
            newly_seen,
        }
    }
}
