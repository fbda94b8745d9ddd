//! APISEQ CLI Library
//!
//! Library functions behind the `apiseq` binary: candidate loading,
//! pipeline invocation, and output writing. Kept out of `main.rs` so the
//! logic is testable without a process boundary.

#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]
// Allow common patterns in test code
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

use apiseq_gen::{CandidateRecord, CandidateStatus, MetadataParser};
use apiseq_report::{CorpusStore, RunSummary};
use apiseq_runner::{BatchReport, CurationConfig, Decision, Pipeline, RecordedMeasurer};
use std::fs;
use std::path::Path;

/// A candidate file that failed to parse; reported and skipped
#[derive(Debug)]
pub struct SkippedFile {
    /// Path of the offending file
    pub path: String,
    /// Parse failure detail
    pub reason: String,
}

/// Result of scanning an input directory
#[derive(Debug, Default)]
pub struct LoadedBatch {
    /// Parsed candidates
    pub candidates: Vec<CandidateRecord>,
    /// Files skipped due to parse failures
    pub skipped: Vec<SkippedFile>,
}

/// Load candidates from `<input>/<library>/<file>` subtrees.
///
/// The first path component below `input` names the target library.
/// Files that fail to parse are collected as skipped, never fatal.
pub fn load_candidates(input: &Path) -> apiseq_report::Result<LoadedBatch> {
    let parser = MetadataParser::new();
    let mut batch = LoadedBatch::default();

    for lib_entry in fs::read_dir(input)? {
        let lib_entry = lib_entry?;
        if !lib_entry.file_type()?.is_dir() {
            continue;
        }
        let library = lib_entry.file_name().to_string_lossy().to_string();
        for file_entry in fs::read_dir(lib_entry.path())? {
            let file_entry = file_entry?;
            if !file_entry.file_type()?.is_file() {
                continue;
            }
            let path = file_entry.path();
            let text = fs::read_to_string(&path)?;
            match parser.parse(&text, &library) {
                Ok(candidate) => batch.candidates.push(candidate),
                Err(e) => batch.skipped.push(SkippedFile {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                }),
            }
        }
    }
    Ok(batch)
}

/// Run the curation pipeline over a loaded batch
pub fn run_curation(candidates: Vec<CandidateRecord>, config: CurationConfig) -> BatchReport {
    Pipeline::new(config).run(candidates, &RecordedMeasurer)
}

/// One-line progress report for a decision
pub fn format_decision(library: &str, decision: &Decision) -> String {
    let tag = match decision.status() {
        CandidateStatus::Accepted => "ACCEPT",
        CandidateStatus::Rejected => "REJECT",
        CandidateStatus::Unusable => "TRIAGE",
        // Evaluation only ends in the three states above; the rest are
        // transient.
        _ => "OTHER",
    };
    let value = decision
        .candidate
        .computed
        .map_or_else(|| "-".to_string(), |s| format!("{:.2}", s.value));
    let mut line = format!(
        "[{tag}] lib={library} id={} value={value} new={}",
        decision.candidate.id, decision.newly_seen,
    );
    if !decision.superseded.is_empty() {
        line.push_str(&format!(" superseded={:?}", decision.superseded));
    }
    line
}

/// Persist a batch report: per-library corpus subtrees plus
/// `summary.md` / `summary.json` at the output root.
///
/// Returns the number of candidate files written.
pub fn write_outputs(
    report: &BatchReport,
    output: &Path,
    keep_rejected: bool,
) -> apiseq_report::Result<usize> {
    let store = CorpusStore::new(output);
    let mut written = 0;
    for outcome in &report.outcomes {
        written += store.save(outcome, keep_rejected)?;
    }

    let summary = RunSummary::from_report(report);
    fs::create_dir_all(output)?;
    fs::write(output.join("summary.md"), summary.to_markdown())?;
    fs::write(output.join("summary.json"), summary.to_json()?)?;
    Ok(written)
}

/// Score one candidate file against an empty ledger and return the
/// record with its score attached, serialized as pretty JSON.
pub fn score_file(path: &Path, library: &str) -> apiseq_report::Result<String> {
    let text = fs::read_to_string(path)?;
    let candidate = MetadataParser::new()
        .parse(&text, library)
        .map_err(|e| apiseq_report::Error::CorruptEntry {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;
    let report = run_curation(
        vec![candidate],
        CurationConfig {
            min_corpus: 0,
            workers: 1,
            keep_rejected: false,
        },
    );
    // One candidate in, one decision out.
    let decision = report
        .outcomes
        .first()
        .and_then(|o| o.decisions.first())
        .map(|d| &d.candidate);
    Ok(serde_json::to_string_pretty(&decision)?)
}

/// Render the summary table for an existing store
pub fn summarize_store(root: &Path) -> apiseq_report::Result<String> {
    let store = CorpusStore::new(root);
    let mut md = String::from("| Library | Entries | Branches |\n|---------|--------:|---------:|\n");
    for library in store.libraries()? {
        if let Some(manifest) = store.load_manifest(&library)? {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                manifest.library,
                manifest.entries.len(),
                manifest.unique_branches,
            ));
        }
    }
    Ok(md)
}
