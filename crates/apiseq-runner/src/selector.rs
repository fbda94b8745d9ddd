//! Corpus selection state machine
//!
//! One selector exclusively owns the ledger and corpus for one library.
//! Candidates move `PENDING -> SCORED -> {ACCEPTED, REJECTED, SUPERSEDED}`;
//! unmeasurable candidates go straight to `UNUSABLE` and the triage list.
//! Terminal states are final.
//!
//! Retained candidates are kept free of strict dominance: accepting a
//! candidate supersedes every retained candidate whose branch set it
//! strictly contains at equal-or-better score. Superseded candidates
//! leave the corpus but their branches stay in the ledger.

use crate::error::{Error, Result};
use crate::ledger::CoverageLedger;
use crate::measure::{Measurement, MeasurementFailure};
use crate::scoring::ScoringEngine;
use apiseq_gen::{CandidateRecord, CandidateStatus, ScoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// An unusable candidate retained for human inspection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageEntry {
    /// The candidate, status set to `UNUSABLE`
    pub candidate: CandidateRecord,
    /// Why measurement failed
    pub failure: MeasurementFailure,
    /// When the failure was recorded
    pub recorded_at: DateTime<Utc>,
}

/// Outcome of evaluating one candidate
#[derive(Debug, Clone)]
pub struct Decision {
    /// The candidate with its final status and recomputed score attached
    pub candidate: CandidateRecord,
    /// Retained candidates displaced by this acceptance
    pub superseded: Vec<u64>,
    /// Branches this candidate added to the ledger
    pub newly_seen: usize,
}

impl Decision {
    /// Final status of the evaluated candidate
    #[must_use]
    pub fn status(&self) -> CandidateStatus {
        self.candidate.status
    }
}

/// Deterministic preference order between retained candidates:
/// higher score, then fewer library calls, then lower id.
#[must_use]
pub fn rank(a: &CandidateRecord, b: &CandidateRecord) -> Ordering {
    b.effective_score()
        .partial_cmp(&a.effective_score())
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.quality.library_calls.len().cmp(&b.quality.library_calls.len()))
        .then_with(|| a.id.cmp(&b.id))
}

/// Per-library accept/reject/supersede state machine
#[derive(Debug)]
pub struct CorpusSelector {
    library: String,
    min_corpus: usize,
    engine: ScoringEngine,
    ledger: CoverageLedger,
    corpus: Vec<CandidateRecord>,
    triage: Vec<TriageEntry>,
}

impl CorpusSelector {
    /// Create a selector for one library.
    ///
    /// `min_corpus` is the retained-set floor: while the corpus holds
    /// fewer candidates, anything measurable is accepted.
    #[must_use]
    pub fn new(library: impl Into<String>, min_corpus: usize) -> Self {
        Self {
            library: library.into(),
            min_corpus,
            engine: ScoringEngine::new(),
            ledger: CoverageLedger::new(),
            corpus: Vec::new(),
            triage: Vec::new(),
        }
    }

    /// The library this selector owns
    #[must_use]
    pub fn library(&self) -> &str {
        &self.library
    }

    /// Currently retained candidates, in preference order
    #[must_use]
    pub fn corpus(&self) -> &[CandidateRecord] {
        &self.corpus
    }

    /// Unusable candidates kept for triage
    #[must_use]
    pub fn triage(&self) -> &[TriageEntry] {
        &self.triage
    }

    /// The ledger this selector owns
    #[must_use]
    pub fn ledger(&self) -> &CoverageLedger {
        &self.ledger
    }

    /// Evaluate one candidate with its measurement and apply the decision.
    ///
    /// # Errors
    ///
    /// Returns an error if the candidate targets another library or is
    /// already in a terminal state. Both indicate a caller bug, not bad
    /// input data.
    pub fn evaluate(
        &mut self,
        mut candidate: CandidateRecord,
        measurement: Measurement,
    ) -> Result<Decision> {
        if candidate.library != self.library {
            return Err(Error::LibraryMismatch {
                expected: self.library.clone(),
                actual: candidate.library,
            });
        }
        if candidate.status.is_terminal() {
            return Err(Error::AlreadyTerminal {
                id: candidate.id,
                status: candidate.status.to_string(),
            });
        }

        let branch_hits = match measurement {
            Measurement::Trace { branch_hits } => branch_hits,
            Measurement::Failed(failure) => {
                candidate.status = CandidateStatus::Unusable;
                self.triage.push(TriageEntry {
                    candidate: candidate.clone(),
                    failure,
                    recorded_at: Utc::now(),
                });
                return Ok(Decision {
                    candidate,
                    superseded: Vec::new(),
                    newly_seen: 0,
                });
            }
        };

        // The trace is the authoritative exercised set from here on.
        candidate.quality.unique_branches = branch_hits;

        let snapshot = self.ledger.snapshot();
        let score = self.engine.score(&candidate, &snapshot);
        candidate.computed = Some(score);
        candidate.status = CandidateStatus::Scored;

        if self.should_accept(&candidate, score) {
            self.accept(candidate)
        } else {
            candidate.status = CandidateStatus::Rejected;
            Ok(Decision {
                candidate,
                superseded: Vec::new(),
                newly_seen: 0,
            })
        }
    }

    fn should_accept(&self, candidate: &CandidateRecord, score: ScoreResult) -> bool {
        if score.newly_seen > 0 || self.corpus.len() < self.min_corpus {
            return true;
        }
        self.corpus.iter().any(|held| {
            dominates(candidate, score.value, held) && held.effective_score() < score.value
        })
    }

    fn accept(&mut self, mut candidate: CandidateRecord) -> Result<Decision> {
        // Commit before the candidate joins the corpus, so the next
        // candidate in the batch observes the updated ledger.
        let newly_seen = self.ledger.commit(candidate.exercised()).len();
        candidate.status = CandidateStatus::Accepted;

        let value = candidate.effective_score();
        let mut superseded = Vec::new();
        self.corpus.retain(|held| {
            if dominates(&candidate, value, held) {
                superseded.push(held.id);
                false
            } else {
                true
            }
        });

        self.corpus.push(candidate.clone());
        self.corpus.sort_by(rank);

        Ok(Decision {
            candidate,
            superseded,
            newly_seen,
        })
    }
}

/// Strict dominance: `held.exercised` is a strict subset of the
/// candidate's and the candidate's score is not lower.
fn dominates(candidate: &CandidateRecord, value: f64, held: &CandidateRecord) -> bool {
    let held_branches = held.exercised();
    let new_branches = candidate.exercised();
    new_branches.len() > held_branches.len()
        && held_branches.is_subset(new_branches)
        && value >= held.effective_score()
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiseq_gen::Quality;
    use std::collections::BTreeSet;

    fn trace(branches: &[&str]) -> Measurement {
        Measurement::Trace {
            branch_hits: branches.iter().map(ToString::to_string).collect(),
        }
    }

    fn candidate(id: u64, branches: &[&str], calls: usize, critical: bool) -> CandidateRecord {
        let quality = Quality {
            unique_branches: branches.iter().map(ToString::to_string).collect(),
            library_calls: (0..calls).map(|i| format!("call_{i}")).collect(),
            critical_calls: if critical {
                vec!["cleanup".to_string()]
            } else {
                Vec::new()
            },
            visited: true,
            ..Quality::empty()
        };
        CandidateRecord::new(id, "cjson", quality)
    }

    fn evaluate(
        selector: &mut CorpusSelector,
        id: u64,
        branches: &[&str],
        calls: usize,
        critical: bool,
    ) -> Decision {
        selector
            .evaluate(candidate(id, branches, calls, critical), trace(branches))
            .unwrap()
    }

    #[test]
    fn test_worked_example_scenario() {
        // min_corpus of zero isolates the coverage-driven rules.
        let mut selector = CorpusSelector::new("cjson", 0);

        // #1: {b1,b2}, 2 calls, no critical -> value 5.0, accepted.
        let d1 = evaluate(&mut selector, 1, &["b1", "b2"], 2, false);
        assert_eq!(d1.status(), CandidateStatus::Accepted);
        assert_eq!(d1.candidate.computed.unwrap().value, 5.0);
        assert_eq!(selector.ledger().unique_branches(), 2);

        // #2: {b1,b2,b3}, 3 calls -> newly={b3}, value 3.0. Dominance over
        // #1 fails (3.0 < 5.0) so #1 stays; #2 accepted on new coverage.
        let d2 = evaluate(&mut selector, 2, &["b1", "b2", "b3"], 3, false);
        assert_eq!(d2.status(), CandidateStatus::Accepted);
        assert_eq!(d2.candidate.computed.unwrap().value, 3.0);
        assert!(d2.superseded.is_empty());
        assert_eq!(selector.corpus().len(), 2);
        assert_eq!(selector.ledger().unique_branches(), 3);

        // #3: empty exercised set, one critical call -> value 1.0, rejected.
        let d3 = evaluate(&mut selector, 3, &[], 1, true);
        assert_eq!(d3.status(), CandidateStatus::Rejected);
        assert_eq!(d3.candidate.computed.unwrap().value, 1.0);
    }

    #[test]
    fn test_min_corpus_floor_accepts() {
        let mut selector = CorpusSelector::new("cjson", 2);
        // No new coverage after the first, but the floor is 2.
        let d1 = evaluate(&mut selector, 1, &["b1"], 1, false);
        let d2 = evaluate(&mut selector, 2, &[], 1, true);
        assert_eq!(d1.status(), CandidateStatus::Accepted);
        assert_eq!(d2.status(), CandidateStatus::Accepted);
        // Floor reached; a third no-coverage candidate is rejected.
        let d3 = evaluate(&mut selector, 3, &[], 1, true);
        assert_eq!(d3.status(), CandidateStatus::Rejected);
    }

    #[test]
    fn test_supersession_on_acceptance() {
        let mut selector = CorpusSelector::new("cjson", 0);
        // #1: {b1}, long sequence -> value 2*1 + 1/4 = 2.25.
        let d1 = evaluate(&mut selector, 1, &["b1"], 4, false);
        assert_eq!(d1.status(), CandidateStatus::Accepted);

        // #2: {b1,b2}, 2 calls -> newly={b2}, value 2 + 1 = 3.0 >= 2.25,
        // strict superset -> #1 superseded.
        let d2 = evaluate(&mut selector, 2, &["b1", "b2"], 2, false);
        assert_eq!(d2.status(), CandidateStatus::Accepted);
        assert_eq!(d2.superseded, vec![1]);
        assert_eq!(selector.corpus().len(), 1);
        assert_eq!(selector.corpus()[0].id, 2);

        // Ledger keeps the superseded candidate's contribution.
        assert_eq!(selector.ledger().unique_branches(), 2);
        assert_eq!(selector.ledger().hit_count("b1"), 2);
    }

    #[test]
    fn test_acceptance_by_dominance_without_new_coverage() {
        let mut selector = CorpusSelector::new("cjson", 0);
        // #1: {b1,b2} over 8 calls, value 2*2 + 0.25 = 4.25.
        evaluate(&mut selector, 1, &["b1", "b2"], 8, false);
        // #2: {b1} only, no new coverage, no dominance -> rejected.
        let d2 = evaluate(&mut selector, 2, &["b1"], 1, false);
        assert_eq!(d2.status(), CandidateStatus::Rejected);
        // #3: same branches {b1,b2} plus b3? No -- keep coverage equal.
        // {b1,b2} over 1 call with a critical call: newly=0,
        // density 2.0, bonus 1.0 -> value 3.0 < 4.25, no dominance
        // (|new| == |held|), rejected.
        let d3 = evaluate(&mut selector, 3, &["b1", "b2"], 1, true);
        assert_eq!(d3.status(), CandidateStatus::Rejected);
    }

    #[test]
    fn test_acceptance_by_dominance_supersedes_weaker() {
        let mut selector = CorpusSelector::new("cjson", 0);
        // #1: {a} over 8 calls -> value 2 + 0.125 = 2.125.
        evaluate(&mut selector, 1, &["a"], 8, false);
        // #2: {b} over 1 call -> accepted on new coverage. Ledger: {a,b}.
        evaluate(&mut selector, 2, &["b"], 1, false);
        // #3: {a,b} over 1 call with a critical call: newly=0 but value
        // 2.0 + 1.0 = 3.0 strictly beats #1 (2.125) on a strict superset,
        // so it is accepted and supersedes both #1 and #2.
        let d3 = evaluate(&mut selector, 3, &["a", "b"], 1, true);
        assert_eq!(d3.status(), CandidateStatus::Accepted);
        assert_eq!(d3.newly_seen, 0);
        let mut superseded = d3.superseded.clone();
        superseded.sort_unstable();
        assert_eq!(superseded, vec![1, 2]);
        assert_eq!(selector.corpus().len(), 1);
        assert_eq!(selector.corpus()[0].id, 3);
    }

    #[test]
    fn test_unusable_goes_to_triage() {
        let mut selector = CorpusSelector::new("cjson", 4);
        let decision = selector
            .evaluate(
                candidate(1, &["b1"], 1, false),
                Measurement::Failed(MeasurementFailure::CompileFailed("no cJSON.h".to_string())),
            )
            .unwrap();
        assert_eq!(decision.status(), CandidateStatus::Unusable);
        assert!(decision.candidate.computed.is_none());
        assert_eq!(selector.triage().len(), 1);
        // Never contributes to the ledger or corpus.
        assert_eq!(selector.ledger().unique_branches(), 0);
        assert!(selector.corpus().is_empty());
    }

    #[test]
    fn test_library_mismatch_is_error() {
        let mut selector = CorpusSelector::new("zlib", 0);
        let err = selector
            .evaluate(candidate(1, &["b1"], 1, false), trace(&["b1"]))
            .unwrap_err();
        assert!(matches!(err, Error::LibraryMismatch { .. }));
    }

    #[test]
    fn test_terminal_candidate_is_error() {
        let mut selector = CorpusSelector::new("cjson", 0);
        let mut done = candidate(1, &["b1"], 1, false);
        done.status = CandidateStatus::Rejected;
        let err = selector.evaluate(done, trace(&["b1"])).unwrap_err();
        assert!(matches!(err, Error::AlreadyTerminal { id: 1, .. }));
    }

    #[test]
    fn test_trace_overrides_header_branches() {
        let mut selector = CorpusSelector::new("cjson", 0);
        // Header claims {b1,b2,b3} but the trace only shows {b1}.
        let c = candidate(1, &["b1", "b2", "b3"], 1, false);
        let decision = selector.evaluate(c, trace(&["b1"])).unwrap();
        assert_eq!(
            decision.candidate.exercised(),
            &["b1"].iter().map(ToString::to_string).collect::<BTreeSet<_>>()
        );
        assert_eq!(selector.ledger().unique_branches(), 1);
    }

    #[test]
    fn test_rank_tie_breaking() {
        let mut a = candidate(5, &["b1", "b2"], 2, false);
        let mut b = candidate(3, &["b3", "b4"], 2, false);
        a.computed = Some(ScoreResult { value: 5.0, newly_seen: 2 });
        b.computed = Some(ScoreResult { value: 5.0, newly_seen: 2 });
        // Equal value and call count: lower id wins.
        assert_eq!(rank(&b, &a), Ordering::Less);

        // Fewer calls wins before id.
        let mut shorter = candidate(9, &["b5"], 1, false);
        shorter.computed = Some(ScoreResult { value: 5.0, newly_seen: 1 });
        assert_eq!(rank(&shorter, &b), Ordering::Less);

        // Higher value wins first.
        let mut strong = candidate(10, &["b6"], 8, false);
        strong.computed = Some(ScoreResult { value: 9.0, newly_seen: 4 });
        assert_eq!(rank(&strong, &shorter), Ordering::Less);
    }

    #[test]
    fn test_corpus_never_holds_dominated_pair() {
        let mut selector = CorpusSelector::new("cjson", 0);
        evaluate(&mut selector, 1, &["a"], 1, false);
        evaluate(&mut selector, 2, &["a", "b"], 1, false);
        evaluate(&mut selector, 3, &["a", "b", "c"], 1, false);
        // Each acceptance dominates and displaces the previous.
        assert_eq!(selector.corpus().len(), 1);
        assert_eq!(selector.corpus()[0].id, 3);
        assert_eq!(selector.ledger().unique_branches(), 3);
    }
}
