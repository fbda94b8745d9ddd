//! APISEQ Curation Pipeline
//!
//! Evaluates streams of measured API-sequence candidates against
//! per-library coverage ledgers and decides which to retain in a bounded
//! corpus. Libraries are evaluated in parallel; within one library,
//! evaluation is strictly serialized because scores and dominance depend
//! on ledger state at the moment of evaluation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
// Allow common patterns
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::needless_pass_by_value)]
// Allow common patterns in test code
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::redundant_clone))]
#![cfg_attr(test, allow(clippy::float_cmp))]

pub mod config;
pub mod error;
pub mod ledger;
pub mod measure;
pub mod pipeline;
pub mod scoring;
pub mod selector;

pub use config::CurationConfig;
pub use error::{Error, Result};
pub use ledger::{CoverageLedger, LedgerSnapshot};
pub use measure::{Measurement, MeasurementFailure, Measurer, MockMeasurer, RecordedMeasurer};
pub use pipeline::{BatchReport, LibraryOutcome, Pipeline};
pub use scoring::ScoringEngine;
pub use selector::{CorpusSelector, Decision, TriageEntry};
