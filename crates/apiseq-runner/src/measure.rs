//! Measurement collaborator interface
//!
//! Compiling and executing a candidate against the real target library is
//! an external concern. The pipeline sees it only through [`Measurer`]:
//! given a candidate, return the raw branch trace or a failure status.
//! The candidate's source is never inspected here.

use apiseq_gen::CandidateRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Why a measurement produced no coverage trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "kind", content = "detail")]
pub enum MeasurementFailure {
    /// The candidate did not compile
    CompileFailed(String),
    /// The candidate crashed during execution
    Crashed(String),
    /// The measurement timed out
    Timeout(String),
}

impl std::fmt::Display for MeasurementFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CompileFailed(msg) => write!(f, "COMPILE_FAILED: {msg}"),
            Self::Crashed(msg) => write!(f, "CRASHED: {msg}"),
            Self::Timeout(msg) => write!(f, "TIMEOUT: {msg}"),
        }
    }
}

/// Result of measuring one candidate
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    /// Coverage trace: the branch ids the candidate hit
    Trace {
        /// Branch identifiers hit during execution
        branch_hits: BTreeSet<String>,
    },
    /// The candidate could not be measured
    Failed(MeasurementFailure),
}

/// External measurement seam
pub trait Measurer: Send + Sync {
    /// Measure one candidate, returning its branch trace or failure.
    fn measure(&self, candidate: &CandidateRecord) -> Measurement;
}

/// Replays the measurement each candidate shipped with.
///
/// The production path for pre-measured corpora: the quality block in a
/// candidate's header is the record of its original measurement, so
/// "measuring" is reading it back. Candidates whose header reports
/// `visited: false` were never executed and are treated as crashed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordedMeasurer;

impl Measurer for RecordedMeasurer {
    fn measure(&self, candidate: &CandidateRecord) -> Measurement {
        if candidate.quality.visited {
            Measurement::Trace {
                branch_hits: candidate.quality.unique_branches.clone(),
            }
        } else {
            Measurement::Failed(MeasurementFailure::Crashed(
                "candidate was never executed during measurement".to_string(),
            ))
        }
    }
}

/// Scripted measurer for tests.
///
/// Outcomes are keyed by `(library, id)`; unscripted candidates fall back
/// to their recorded quality block.
#[derive(Debug, Default)]
pub struct MockMeasurer {
    scripted: HashMap<(String, u64), Measurement>,
}

impl MockMeasurer {
    /// Create an empty mock
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script an outcome for one candidate
    pub fn script(&mut self, library: impl Into<String>, id: u64, outcome: Measurement) {
        self.scripted.insert((library.into(), id), outcome);
    }

    /// Builder form of [`Self::script`]
    #[must_use]
    pub fn with_outcome(
        mut self,
        library: impl Into<String>,
        id: u64,
        outcome: Measurement,
    ) -> Self {
        self.script(library, id, outcome);
        self
    }
}

impl Measurer for MockMeasurer {
    fn measure(&self, candidate: &CandidateRecord) -> Measurement {
        self.scripted
            .get(&(candidate.library.clone(), candidate.id))
            .cloned()
            .unwrap_or_else(|| RecordedMeasurer.measure(candidate))
    }
}
