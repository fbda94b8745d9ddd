//! Corpus store
//!
//! On-disk layout, one subtree per library:
//!
//! ```text
//! <root>/<library>/corpus/<id>_test.txt     retained candidates
//! <root>/<library>/triage/<id>_test.txt     unusable candidates
//! <root>/<library>/rejected/<id>_test.txt   rejected (opt-in)
//! <root>/<library>/manifest.json            ids, statuses, fingerprints
//! ```
//!
//! Candidate files use the header wire format and carry the recomputed
//! score and density, never the stale inbound values. The manifest
//! records a sha256 fingerprint of each candidate's source so corruption
//! and duplicates are detectable without reparsing.

use crate::error::{Error, Result};
use apiseq_gen::{CandidateRecord, CandidateStatus, MetadataParser, render_record};
use apiseq_runner::{LibraryOutcome, MeasurementFailure};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Compute the sha256 hex digest of a candidate source body
#[must_use]
pub fn compute_sha256(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// One manifest row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Candidate id
    pub id: u64,
    /// File name relative to the library subtree
    pub file: String,
    /// Final status
    pub status: CandidateStatus,
    /// Recomputed score
    pub score: f64,
    /// sha256 of the source body
    pub sha256: String,
    /// Measurement failure, for triage entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<MeasurementFailure>,
}

/// Per-library manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Library name
    pub library: String,
    /// When the corpus was written
    pub generated_at: DateTime<Utc>,
    /// Distinct branches credited to the ledger during the run
    pub unique_branches: usize,
    /// All persisted candidates
    pub entries: Vec<ManifestEntry>,
}

/// Serializes and deserializes curated corpora
#[derive(Debug, Clone)]
pub struct CorpusStore {
    root: PathBuf,
}

impl CorpusStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding one library's subtree
    #[must_use]
    pub fn library_dir(&self, library: &str) -> PathBuf {
        self.root.join(library)
    }

    /// Persist one library's outcome.
    ///
    /// Writes retained candidates, triage entries, optionally rejected
    /// candidates, and the manifest. Returns the number of files written.
    ///
    /// # Errors
    ///
    /// Returns an error on any filesystem or serialization failure.
    pub fn save(&self, outcome: &LibraryOutcome, keep_rejected: bool) -> Result<usize> {
        let dir = self.library_dir(&outcome.library);
        let mut entries = Vec::new();
        let mut written = 0;

        let corpus_dir = dir.join("corpus");
        fs::create_dir_all(&corpus_dir)?;
        for candidate in &outcome.corpus {
            let file = format!("{}_test.txt", candidate.id);
            fs::write(corpus_dir.join(&file), render_record(candidate))?;
            entries.push(ManifestEntry {
                id: candidate.id,
                file: format!("corpus/{file}"),
                status: candidate.status,
                score: candidate.effective_score(),
                sha256: compute_sha256(&candidate.source),
                failure: None,
            });
            written += 1;
        }

        if !outcome.triage.is_empty() {
            let triage_dir = dir.join("triage");
            fs::create_dir_all(&triage_dir)?;
            for entry in &outcome.triage {
                let file = format!("{}_test.txt", entry.candidate.id);
                fs::write(triage_dir.join(&file), render_record(&entry.candidate))?;
                entries.push(ManifestEntry {
                    id: entry.candidate.id,
                    file: format!("triage/{file}"),
                    status: CandidateStatus::Unusable,
                    score: 0.0,
                    sha256: compute_sha256(&entry.candidate.source),
                    failure: Some(entry.failure.clone()),
                });
                written += 1;
            }
        }

        if keep_rejected {
            let rejected: Vec<&CandidateRecord> = outcome
                .decisions
                .iter()
                .filter(|d| d.status() == CandidateStatus::Rejected)
                .map(|d| &d.candidate)
                .collect();
            if !rejected.is_empty() {
                let rejected_dir = dir.join("rejected");
                fs::create_dir_all(&rejected_dir)?;
                for candidate in rejected {
                    let file = format!("{}_test.txt", candidate.id);
                    fs::write(rejected_dir.join(&file), render_record(candidate))?;
                    entries.push(ManifestEntry {
                        id: candidate.id,
                        file: format!("rejected/{file}"),
                        status: CandidateStatus::Rejected,
                        score: candidate.effective_score(),
                        sha256: compute_sha256(&candidate.source),
                        failure: None,
                    });
                    written += 1;
                }
            }
        }

        let manifest = Manifest {
            library: outcome.library.clone(),
            generated_at: Utc::now(),
            unique_branches: outcome.unique_branches,
            entries,
        };
        fs::write(
            dir.join("manifest.json"),
            serde_json::to_string_pretty(&manifest)?,
        )?;
        Ok(written)
    }

    /// Load one library's retained corpus.
    ///
    /// # Errors
    ///
    /// Returns an error if a corpus file cannot be read or reparsed;
    /// a missing corpus directory loads as empty.
    pub fn load(&self, library: &str) -> Result<Vec<CandidateRecord>> {
        let corpus_dir = self.library_dir(library).join("corpus");
        let mut candidates = self.load_dir(&corpus_dir, library)?;
        candidates.sort_by_key(|c| c.id);
        Ok(candidates)
    }

    /// Load one library's triage candidates.
    ///
    /// # Errors
    ///
    /// Returns an error if a triage file cannot be read or reparsed.
    pub fn load_triage(&self, library: &str) -> Result<Vec<CandidateRecord>> {
        let triage_dir = self.library_dir(library).join("triage");
        let mut candidates = self.load_dir(&triage_dir, library)?;
        candidates.sort_by_key(|c| c.id);
        Ok(candidates)
    }

    /// Load one library's manifest, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest exists but cannot be parsed.
    pub fn load_manifest(&self, library: &str) -> Result<Option<Manifest>> {
        let path = self.library_dir(library).join("manifest.json");
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Libraries that have a subtree under the store root
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be listed.
    pub fn libraries(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut libraries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                libraries.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        libraries.sort();
        Ok(libraries)
    }

    fn load_dir(&self, dir: &Path, library: &str) -> Result<Vec<CandidateRecord>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let parser = MetadataParser::new();
        let mut candidates = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let text = fs::read_to_string(entry.path())?;
            let record = parser
                .parse(&text, library)
                .map_err(|e| Error::CorruptEntry {
                    file: entry.file_name().to_string_lossy().to_string(),
                    reason: e.to_string(),
                })?;
            candidates.push(record);
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiseq_gen::Quality;
    use apiseq_runner::{CurationConfig, Measurement, MockMeasurer, Pipeline, RecordedMeasurer};
    use tempfile::TempDir;

    fn candidate(library: &str, id: u64, branches: &[&str], calls: usize) -> CandidateRecord {
        let quality = Quality {
            unique_branches: branches.iter().map(ToString::to_string).collect(),
            library_calls: (0..calls).map(|i| format!("call_{i}")).collect(),
            critical_calls: Vec::new(),
            visited: true,
            density: 0.0,
        };
        CandidateRecord::new(id, library, quality)
            .with_provenance("stress the parser", "parse, print, delete")
            .with_source(format!("// candidate {id}\nint main() {{ return 0; }}\n"))
    }

    fn run_outcome(batch: Vec<CandidateRecord>) -> LibraryOutcome {
        let pipeline = Pipeline::new(CurationConfig {
            min_corpus: 0,
            workers: 1,
            keep_rejected: true,
        });
        let mut report = pipeline.run(batch, &RecordedMeasurer);
        report.outcomes.remove(0)
    }

    #[test]
    fn test_save_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = CorpusStore::new(tmp.path());
        let outcome = run_outcome(vec![
            candidate("cjson", 1, &["b1", "b2"], 2),
            candidate("cjson", 2, &["b1", "b2", "b3"], 3),
        ]);
        let written = store.save(&outcome, false).unwrap();
        assert_eq!(written, 2);

        let loaded = store.load("cjson").unwrap();
        assert_eq!(loaded.len(), 2);
        for (loaded, original) in loaded.iter().zip(&outcome.corpus[..]) {
            // Corpus is preference-ordered, load is id-ordered; compare by id.
            let original = outcome
                .corpus
                .iter()
                .find(|c| c.id == loaded.id)
                .unwrap_or(original);
            assert_eq!(loaded.quality.unique_branches, original.quality.unique_branches);
            assert_eq!(loaded.quality.library_calls, original.quality.library_calls);
            assert_eq!(loaded.status, CandidateStatus::Accepted);
            assert_eq!(loaded.prompt, original.prompt);
            assert_eq!(loaded.combination, original.combination);
            assert_eq!(loaded.source, original.source);
        }
    }

    #[test]
    fn test_save_emits_recomputed_score() {
        let tmp = TempDir::new().unwrap();
        let store = CorpusStore::new(tmp.path());
        let mut input = candidate("cjson", 1, &["b1", "b2"], 2);
        input.raw_score = 999.0;
        let outcome = run_outcome(vec![input]);
        store.save(&outcome, false).unwrap();

        let loaded = store.load("cjson").unwrap();
        // 2 new branches * 2.0 + density 1.0 = 5.0, not the stale 999.
        assert_eq!(loaded[0].raw_score, 5.0);
    }

    #[test]
    fn test_triage_is_persisted() {
        let tmp = TempDir::new().unwrap();
        let store = CorpusStore::new(tmp.path());
        let mock = MockMeasurer::new().with_outcome(
            "cjson",
            1,
            Measurement::Failed(apiseq_runner::MeasurementFailure::CompileFailed(
                "missing header".to_string(),
            )),
        );
        let pipeline = Pipeline::new(CurationConfig {
            min_corpus: 0,
            workers: 1,
            keep_rejected: false,
        });
        let mut input = candidate("cjson", 1, &["b1"], 1);
        input.raw_score = 42.0;
        let mut report = pipeline.run(vec![input], &mock);
        let outcome = report.outcomes.remove(0);
        store.save(&outcome, false).unwrap();

        let triage = store.load_triage("cjson").unwrap();
        assert_eq!(triage.len(), 1);
        assert_eq!(triage[0].status, CandidateStatus::Unusable);
        // The persisted file and the manifest agree: no score.
        assert_eq!(triage[0].raw_score, 0.0);

        let manifest = store.load_manifest("cjson").unwrap().unwrap();
        assert_eq!(manifest.entries.len(), 1);
        assert_eq!(manifest.entries[0].score, 0.0);
        assert!(manifest.entries[0].failure.is_some());
    }

    #[test]
    fn test_keep_rejected_sidecar() {
        let tmp = TempDir::new().unwrap();
        let store = CorpusStore::new(tmp.path());
        let outcome = run_outcome(vec![
            candidate("cjson", 1, &["b1"], 1),
            candidate("cjson", 2, &[], 1),
        ]);
        store.save(&outcome, true).unwrap();
        assert!(store.library_dir("cjson").join("rejected/2_test.txt").exists());

        // Without the flag the sidecar is not written.
        let tmp2 = TempDir::new().unwrap();
        let store2 = CorpusStore::new(tmp2.path());
        store2.save(&outcome, false).unwrap();
        assert!(!store2.library_dir("cjson").join("rejected").exists());
    }

    #[test]
    fn test_manifest_fingerprints() {
        let tmp = TempDir::new().unwrap();
        let store = CorpusStore::new(tmp.path());
        let outcome = run_outcome(vec![candidate("cjson", 7, &["b1"], 1)]);
        store.save(&outcome, false).unwrap();

        let manifest = store.load_manifest("cjson").unwrap().unwrap();
        assert_eq!(manifest.library, "cjson");
        assert_eq!(manifest.unique_branches, 1);
        let entry = &manifest.entries[0];
        assert_eq!(entry.id, 7);
        assert_eq!(entry.sha256, compute_sha256(&outcome.corpus[0].source));
        assert_eq!(entry.sha256.len(), 64);
    }

    #[test]
    fn test_missing_library_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = CorpusStore::new(tmp.path());
        assert!(store.load("nope").unwrap().is_empty());
        assert!(store.load_manifest("nope").unwrap().is_none());
        assert!(store.libraries().unwrap().is_empty());
    }

    #[test]
    fn test_libraries_listing() {
        let tmp = TempDir::new().unwrap();
        let store = CorpusStore::new(tmp.path());
        store
            .save(&run_outcome(vec![candidate("zlib", 1, &["z"], 1)]), false)
            .unwrap();
        store
            .save(&run_outcome(vec![candidate("cjson", 1, &["c"], 1)]), false)
            .unwrap();
        assert_eq!(store.libraries().unwrap(), vec!["cjson", "zlib"]);
    }

    #[test]
    fn test_sha256_stability() {
        assert_eq!(compute_sha256(""), compute_sha256(""));
        assert_ne!(compute_sha256("a"), compute_sha256("b"));
    }
}
