//! Batch run summaries
//!
//! One row per library: how many candidates were seen, how the decisions
//! fell, and where the ledger ended up. Rendered as markdown for humans
//! and JSON for tooling.

use crate::error::Result;
use apiseq_gen::CandidateStatus;
use apiseq_runner::{BatchReport, LibraryOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary row for one library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibrarySummary {
    /// Library name
    pub library: String,
    /// Candidates evaluated
    pub candidates: usize,
    /// Accepted count
    pub accepted: usize,
    /// Rejected count
    pub rejected: usize,
    /// Retained candidates displaced during the run
    pub superseded: usize,
    /// Unusable (triage) count
    pub unusable: usize,
    /// Distinct branches credited to the ledger
    pub unique_branches: usize,
    /// Final retained corpus size
    pub corpus_size: usize,
}

impl From<&LibraryOutcome> for LibrarySummary {
    fn from(outcome: &LibraryOutcome) -> Self {
        Self {
            library: outcome.library.clone(),
            candidates: outcome.decisions.len(),
            accepted: outcome.count(CandidateStatus::Accepted),
            rejected: outcome.count(CandidateStatus::Rejected),
            superseded: outcome.superseded_count(),
            unusable: outcome.count(CandidateStatus::Unusable),
            unique_branches: outcome.unique_branches,
            corpus_size: outcome.corpus.len(),
        }
    }
}

/// Summary of one batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// When the summary was generated
    pub generated_at: DateTime<Utc>,
    /// Batch wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Per-library rows, sorted by library name
    pub libraries: Vec<LibrarySummary>,
}

impl RunSummary {
    /// Build a summary from a batch report
    #[must_use]
    pub fn from_report(report: &BatchReport) -> Self {
        Self {
            generated_at: Utc::now(),
            duration_ms: report.duration_ms,
            libraries: report.outcomes.iter().map(LibrarySummary::from).collect(),
        }
    }

    /// Total candidates across libraries
    #[must_use]
    pub fn total_candidates(&self) -> usize {
        self.libraries.iter().map(|l| l.candidates).sum()
    }

    /// Render a markdown table
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str("# Corpus Curation Summary\n\n");
        md.push_str(&format!(
            "Generated: {} | Duration: {}ms | Candidates: {}\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.duration_ms,
            self.total_candidates(),
        ));
        md.push_str(
            "| Library | Candidates | Accepted | Rejected | Superseded | Unusable | Branches | Corpus |\n",
        );
        md.push_str(
            "|---------|-----------:|---------:|---------:|-----------:|---------:|---------:|-------:|\n",
        );
        for row in &self.libraries {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
                row.library,
                row.candidates,
                row.accepted,
                row.rejected,
                row.superseded,
                row.unusable,
                row.unique_branches,
                row.corpus_size,
            ));
        }
        md
    }

    /// Export to pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
