//! Candidate records
//!
//! A candidate is one generated API-sequence test program plus the
//! coverage metadata it was measured with. Branch identifiers are opaque
//! strings, namespaced per target library; sets are `BTreeSet` so that
//! iteration order, serialization, and scoring are deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Lifecycle state of a candidate in the curation pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateStatus {
    /// Read from the input stream, not yet scored
    Pending,
    /// Scored against a ledger snapshot, selection not yet decided
    Scored,
    /// Retained in the corpus
    Accepted,
    /// Evaluated and dropped
    Rejected,
    /// Was retained, later displaced by a dominating candidate
    Superseded,
    /// Measurement failed; kept on the triage list, never scored
    Unusable,
}

impl CandidateStatus {
    /// Whether a candidate in this state is currently part of the corpus
    #[must_use]
    pub const fn is_retained(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Whether this state is final (no further transitions)
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Accepted | Self::Rejected | Self::Superseded | Self::Unusable
        )
    }

    /// Wire name used in serialized headers
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Scored => "SCORED",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::Superseded => "SUPERSEDED",
            Self::Unusable => "UNUSABLE",
        }
    }

    /// Parse a wire name
    #[must_use]
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.trim() {
            "PENDING" => Some(Self::Pending),
            "SCORED" => Some(Self::Scored),
            "ACCEPTED" => Some(Self::Accepted),
            "REJECTED" => Some(Self::Rejected),
            "SUPERSEDED" => Some(Self::Superseded),
            "UNUSABLE" => Some(Self::Unusable),
            _ => None,
        }
    }
}

impl std::fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coverage quality block attached to a candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quality {
    /// Branches hit per library call made
    pub density: f64,
    /// Branch identifiers the candidate's own measurement reports hitting
    pub unique_branches: BTreeSet<String>,
    /// Library API calls made, in call order
    pub library_calls: Vec<String>,
    /// Designated critical calls exercised (allocator, cleanup, error paths)
    pub critical_calls: Vec<String>,
    /// Whether the candidate was actually executed during measurement
    pub visited: bool,
}

impl Quality {
    /// Create an empty quality block
    #[must_use]
    pub fn empty() -> Self {
        Self {
            density: 0.0,
            unique_branches: BTreeSet::new(),
            library_calls: Vec::new(),
            critical_calls: Vec::new(),
            visited: false,
        }
    }

    /// Branches exercised per call made, recomputed from the raw sets.
    /// A candidate that made no calls is treated as having made one, so
    /// an empty sequence cannot score an infinite density.
    #[must_use]
    pub fn recomputed_density(&self) -> f64 {
        self.unique_branches.len() as f64 / self.library_calls.len().max(1) as f64
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::empty()
    }
}

/// Score computed for a candidate against a ledger snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Composite score value
    pub value: f64,
    /// Branches this candidate would add to the ledger
    pub newly_seen: usize,
}

/// One generated test program plus its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Identifier, unique within one library's input stream
    pub id: u64,
    /// Target library name; partitioning key for ledgers and corpora
    pub library: String,
    /// Provenance tag: the prompt that produced this candidate
    pub prompt: String,
    /// Provenance tag: the API combination the generator was steered with
    pub combination: String,
    /// Score the candidate arrived with; a stale hint, never used in decisions
    pub raw_score: f64,
    /// Coverage quality block
    pub quality: Quality,
    /// Full candidate body; opaque payload, never inspected
    pub source: String,
    /// Current lifecycle state
    pub status: CandidateStatus,
    /// Recomputed score, attached by the scoring engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed: Option<ScoreResult>,
}

impl CandidateRecord {
    /// Create a pending candidate
    #[must_use]
    pub fn new(id: u64, library: impl Into<String>, quality: Quality) -> Self {
        Self {
            id,
            library: library.into(),
            prompt: String::new(),
            combination: String::new(),
            raw_score: 0.0,
            quality,
            source: String::new(),
            status: CandidateStatus::Pending,
            computed: None,
        }
    }

    /// Attach the source payload
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Attach provenance tags
    #[must_use]
    pub fn with_provenance(
        mut self,
        prompt: impl Into<String>,
        combination: impl Into<String>,
    ) -> Self {
        self.prompt = prompt.into();
        self.combination = combination.into();
        self
    }

    /// The branch set the candidate's measurement reports hitting
    #[must_use]
    pub fn exercised(&self) -> &BTreeSet<String> {
        &self.quality.unique_branches
    }

    /// Score value if the candidate has been scored, else the stale hint
    #[must_use]
    pub fn effective_score(&self) -> f64 {
        self.computed.map_or(self.raw_score, |s| s.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branches(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_status_predicates() {
        assert!(CandidateStatus::Accepted.is_retained());
        assert!(!CandidateStatus::Superseded.is_retained());
        assert!(CandidateStatus::Rejected.is_terminal());
        assert!(CandidateStatus::Unusable.is_terminal());
        assert!(!CandidateStatus::Pending.is_terminal());
        assert!(!CandidateStatus::Scored.is_terminal());
    }

    #[test]
    fn test_status_wire_round_trip() {
        for status in [
            CandidateStatus::Pending,
            CandidateStatus::Scored,
            CandidateStatus::Accepted,
            CandidateStatus::Rejected,
            CandidateStatus::Superseded,
            CandidateStatus::Unusable,
        ] {
            assert_eq!(CandidateStatus::from_wire(status.as_str()), Some(status));
        }
        assert_eq!(CandidateStatus::from_wire("BOGUS"), None);
    }

    #[test]
    fn test_recomputed_density() {
        let quality = Quality {
            unique_branches: branches(&["b1", "b2", "b3"]),
            library_calls: vec!["open".to_string(), "close".to_string()],
            ..Quality::empty()
        };
        assert_eq!(quality.recomputed_density(), 1.5);
    }

    #[test]
    fn test_recomputed_density_no_calls() {
        let quality = Quality {
            unique_branches: branches(&["b1"]),
            ..Quality::empty()
        };
        // Zero calls divides by one, not zero.
        assert_eq!(quality.recomputed_density(), 1.0);
    }

    #[test]
    fn test_effective_score_prefers_computed() {
        let mut candidate = CandidateRecord::new(1, "cjson", Quality::empty());
        candidate.raw_score = 9.5;
        assert_eq!(candidate.effective_score(), 9.5);
        candidate.computed = Some(ScoreResult {
            value: 3.0,
            newly_seen: 1,
        });
        assert_eq!(candidate.effective_score(), 3.0);
    }

    #[test]
    fn test_candidate_builders() {
        let candidate = CandidateRecord::new(7, "zlib", Quality::empty())
            .with_source("int main() { return 0; }")
            .with_provenance("use deflate then inflate", "deflateInit,deflate,deflateEnd");
        assert_eq!(candidate.id, 7);
        assert_eq!(candidate.library, "zlib");
        assert_eq!(candidate.status, CandidateStatus::Pending);
        assert!(candidate.source.contains("main"));
        assert!(candidate.combination.contains("deflate"));
    }

    #[test]
    fn test_candidate_json_round_trip() {
        let mut candidate = CandidateRecord::new(3, "re2", Quality::empty());
        candidate.quality.unique_branches = branches(&["e1", "e2"]);
        candidate.status = CandidateStatus::Accepted;
        let json = serde_json::to_string(&candidate).unwrap();
        assert!(json.contains("\"ACCEPTED\""));
        let back: CandidateRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, candidate);
    }
}
