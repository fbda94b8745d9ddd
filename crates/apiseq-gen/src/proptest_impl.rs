//! Proptest strategies for candidate types
//!
//! Used by property tests in this crate and downstream to generate
//! well-formed candidates without hand-writing fixtures.

use crate::candidate::{CandidateRecord, Quality};
use proptest::collection::{btree_set, vec};
use proptest::prelude::*;

/// Strategy for branch identifiers (`<file>:<edge>` shaped)
pub fn branch_id_strategy() -> impl Strategy<Value = String> {
    ("[a-z]{2,8}", 0u32..5000).prop_map(|(file, edge)| format!("{file}.c:{edge}"))
}

/// Strategy for library API call names
pub fn call_name_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "cJSON_Parse",
        "cJSON_Delete",
        "cJSON_CreateTrue",
        "cJSON_IsFalse",
        "deflateInit",
        "inflate",
        "png_create_read_struct",
        "png_destroy_read_struct",
        "cmsCreateTransform",
        "pcap_open_live",
        "pcap_close",
        "re2_match",
        "sqlite3_open",
        "sqlite3_close",
    ])
    .prop_map(ToString::to_string)
}

/// Strategy for target library names
pub fn library_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "cjson", "zlib", "sqlite", "lcms", "libpcap", "re2", "libpng",
    ])
    .prop_map(ToString::to_string)
}

/// Strategy for quality blocks
pub fn quality_strategy() -> impl Strategy<Value = Quality> {
    (
        btree_set(branch_id_strategy(), 0..12),
        vec(call_name_strategy(), 0..8),
        vec(call_name_strategy(), 0..3),
        any::<bool>(),
    )
        .prop_map(
            |(unique_branches, library_calls, critical_calls, visited)| {
                let density =
                    unique_branches.len() as f64 / library_calls.len().max(1) as f64;
                Quality {
                    density,
                    unique_branches,
                    library_calls,
                    critical_calls,
                    visited,
                }
            },
        )
}

/// Strategy for full candidate records
pub fn candidate_strategy() -> impl Strategy<Value = CandidateRecord> {
    (
        0u64..10_000,
        library_strategy(),
        quality_strategy(),
        "[ -~]{0,40}",
    )
        .prop_map(|(id, library, quality, prompt)| {
            let mut record = CandidateRecord::new(id, library, quality)
                .with_provenance(prompt, String::new())
                .with_source("// generated body\nint main() { return 0; }\n");
            record.raw_score = 0.0;
            record
        })
}
