//! APISEQ Candidate Model
//!
//! Data model and metadata wire format for generated API-sequence test
//! candidates. A candidate is one generated program exercising a target
//! native library, carried through the curation pipeline together with
//! the coverage metadata block that precedes its source text.
//!
//! The source body itself is an opaque payload: this crate parses and
//! renders only the metadata header.

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
#![cfg_attr(test, allow(clippy::float_cmp))]

pub mod candidate;
pub mod error;
pub mod header;
pub mod proptest_impl;

pub use candidate::{CandidateRecord, CandidateStatus, Quality, ScoreResult};
pub use error::{Error, Result};
pub use header::{MetadataParser, render_record, split_header};
