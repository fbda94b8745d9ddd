//! Batch evaluation pipeline
//!
//! Groups a candidate batch by target library and evaluates the groups in
//! parallel with rayon. Each library gets its own selector, evaluated by
//! exactly one worker in ascending-id order, so ledger commits are
//! single-writer by construction and a rerun over the same input
//! reproduces the same decisions.

use crate::config::CurationConfig;
use crate::measure::Measurer;
use crate::selector::{CorpusSelector, Decision, TriageEntry};
use apiseq_gen::{CandidateRecord, CandidateStatus};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::Instant;

/// Everything produced for one library by a batch run
#[derive(Debug)]
pub struct LibraryOutcome {
    /// Target library
    pub library: String,
    /// Per-candidate decisions, in evaluation order
    pub decisions: Vec<Decision>,
    /// Final retained corpus, in preference order
    pub corpus: Vec<CandidateRecord>,
    /// Unusable candidates kept for triage
    pub triage: Vec<TriageEntry>,
    /// Distinct branches ever credited to the ledger
    pub unique_branches: usize,
    /// Sum of ledger hit counts
    pub total_hits: u64,
    /// Candidates that could not be evaluated (caller bugs surfaced as
    /// data; the batch continues past them)
    pub errors: Vec<String>,
}

impl LibraryOutcome {
    /// Count of decisions with the given final status
    #[must_use]
    pub fn count(&self, status: CandidateStatus) -> usize {
        self.decisions
            .iter()
            .filter(|d| d.status() == status)
            .count()
    }

    /// Number of retained candidates displaced during the run
    #[must_use]
    pub fn superseded_count(&self) -> usize {
        self.decisions.iter().map(|d| d.superseded.len()).sum()
    }
}

/// Merged result of one batch run
#[derive(Debug)]
pub struct BatchReport {
    /// Per-library outcomes, sorted by library name
    pub outcomes: Vec<LibraryOutcome>,
    /// Wall-clock duration of the batch in milliseconds
    pub duration_ms: u64,
}

impl BatchReport {
    /// Total candidates evaluated across libraries
    #[must_use]
    pub fn total_candidates(&self) -> usize {
        self.outcomes.iter().map(|o| o.decisions.len()).sum()
    }

    /// Total candidates retained across libraries
    #[must_use]
    pub fn total_retained(&self) -> usize {
        self.outcomes.iter().map(|o| o.corpus.len()).sum()
    }

    /// Outcome for one library, if it appeared in the batch
    #[must_use]
    pub fn for_library(&self, library: &str) -> Option<&LibraryOutcome> {
        self.outcomes.iter().find(|o| o.library == library)
    }
}

/// Batch pipeline over per-library selectors
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: CurationConfig,
}

impl Pipeline {
    /// Create a pipeline
    #[must_use]
    pub fn new(config: CurationConfig) -> Self {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .build_global()
            .ok(); // Ignore if already configured
        Self { config }
    }

    /// Evaluate a batch of candidates.
    ///
    /// Candidates are partitioned by library; libraries run in parallel,
    /// candidates within a library strictly in ascending-id order.
    #[must_use]
    pub fn run(&self, candidates: Vec<CandidateRecord>, measurer: &dyn Measurer) -> BatchReport {
        let start = Instant::now();

        let mut by_library: BTreeMap<String, Vec<CandidateRecord>> = BTreeMap::new();
        for candidate in candidates {
            by_library
                .entry(candidate.library.clone())
                .or_default()
                .push(candidate);
        }

        let mut outcomes: Vec<LibraryOutcome> = by_library
            .into_par_iter()
            .map(|(library, group)| self.run_library(library, group, measurer))
            .collect();
        outcomes.sort_by(|a, b| a.library.cmp(&b.library));

        BatchReport {
            outcomes,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn run_library(
        &self,
        library: String,
        mut group: Vec<CandidateRecord>,
        measurer: &dyn Measurer,
    ) -> LibraryOutcome {
        group.sort_by_key(|c| c.id);

        let mut selector = CorpusSelector::new(library.clone(), self.config.min_corpus);
        let mut decisions = Vec::with_capacity(group.len());
        let mut errors = Vec::new();

        for candidate in group {
            let measurement = measurer.measure(&candidate);
            match selector.evaluate(candidate, measurement) {
                Ok(decision) => decisions.push(decision),
                Err(e) => errors.push(e.to_string()),
            }
        }

        LibraryOutcome {
            library,
            corpus: selector.corpus().to_vec(),
            triage: selector.triage().to_vec(),
            unique_branches: selector.ledger().unique_branches(),
            total_hits: selector.ledger().total_hits(),
            decisions,
            errors,
        }
    }
}
