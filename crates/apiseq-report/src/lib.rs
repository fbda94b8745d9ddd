//! APISEQ Reporting
//!
//! Persists curated corpora in the candidate header wire format and
//! renders batch run summaries.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
// Allow common patterns
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_pass_by_value)]
// Allow common patterns in test code
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::redundant_clone))]

pub mod error;
pub mod store;
pub mod summary;

pub use error::{Error, Result};
pub use store::{CorpusStore, Manifest, ManifestEntry, compute_sha256};
pub use summary::{LibrarySummary, RunSummary};
