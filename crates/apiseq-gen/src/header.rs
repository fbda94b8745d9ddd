//! Metadata header wire format
//!
//! Every candidate file carries a header block ahead of its opaque source
//! body:
//!
//! ```text
//! id: 42
//! prompt: <free text, possibly empty>
//! combination: <free text, possibly empty>
//! score: 5.0
//! status: ACCEPTED
//! quality: {
//!   "density": 1.5,
//!   "unique_branches": ["b1", "b2"],
//!   "library_calls": ["png_create_read_struct"],
//!   "critical_calls": [],
//!   "visited": true
//! }
//!
//! <source>
//! ```
//!
//! `id` and `quality.unique_branches` are required; everything else
//! defaults. The quality block is JSON, with two tolerances for
//! generator-emitted headers: single-quoted strings and bare Python-style
//! `True`/`False`/`None` literals are normalized before parsing, and
//! `unique_branches` may be either an array of branch ids or a mapping
//! from branch id to a hit count/flag. Rendering always emits the
//! canonical sorted-array form with the recomputed score and density.

use crate::candidate::{CandidateRecord, CandidateStatus, Quality};
use crate::error::{Error, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

static FIELD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // Verified at compile time, unwrap is safe here
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^(?P<key>id|prompt|combination|score|status|quality)\s*:\s*(?P<value>.*)$")
        .unwrap()
});

/// Accepts both wire forms of `unique_branches`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BranchSet {
    /// Canonical array form: `["b1", "b2"]`
    Set(BTreeSet<String>),
    /// Legacy mapping form: `{"b1": 1, "b2": true}`
    Map(BTreeMap<String, serde_json::Value>),
}

impl BranchSet {
    fn into_set(self) -> BTreeSet<String> {
        match self {
            Self::Set(set) => set,
            Self::Map(map) => map.into_keys().collect(),
        }
    }
}

/// Quality block as it appears on the wire
#[derive(Debug, Deserialize)]
struct QualityWire {
    #[serde(default)]
    density: f64,
    unique_branches: BranchSet,
    #[serde(default)]
    library_calls: Vec<String>,
    #[serde(default)]
    critical_calls: Vec<String>,
    #[serde(default)]
    visited: bool,
}

impl From<QualityWire> for Quality {
    fn from(wire: QualityWire) -> Self {
        Self {
            density: wire.density,
            unique_branches: wire.unique_branches.into_set(),
            library_calls: wire.library_calls,
            critical_calls: wire.critical_calls,
            visited: wire.visited,
        }
    }
}

/// Split a candidate file into its header block and source payload.
///
/// The header ends when the quality block's braces balance; the source is
/// everything after the following blank line (or immediately after the
/// block when no blank line is present).
#[must_use]
pub fn split_header(text: &str) -> (String, String) {
    let mut header_lines = Vec::new();
    let mut depth: i64 = 0;
    let mut in_quality = false;
    let mut rest_at = text.len();

    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_end();
        header_lines.push(trimmed);
        offset += line.len();

        if !in_quality && trimmed.trim_start().starts_with("quality") {
            in_quality = true;
        }
        if in_quality {
            depth += i64::try_from(trimmed.matches('{').count()).unwrap_or(0);
            depth -= i64::try_from(trimmed.matches('}').count()).unwrap_or(0);
            if depth == 0 && trimmed.contains('}') {
                rest_at = offset;
                break;
            }
        }
    }

    let source = text[rest_at..].trim_start_matches('\n').to_string();
    (header_lines.join("\n"), source)
}

/// Normalize generator-emitted quality blocks into strict JSON.
///
/// Single-quoted strings become double-quoted and bare `True`/`False`/
/// `None` words become their JSON forms. String contents are copied
/// verbatim, so call and branch names like `cJSON_CreateTrue` survive
/// untouched; strict JSON input passes through unchanged.
fn normalize_json(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                out.push('"');
                loop {
                    match chars.next() {
                        None => break,
                        Some(inner) if inner == c => break,
                        Some('\\') => match chars.next() {
                            // `\'` is not a JSON escape; emit a bare quote.
                            Some('\'') => out.push('\''),
                            Some(escaped) => {
                                out.push('\\');
                                out.push(escaped);
                            }
                            None => break,
                        },
                        // Unescaped `"` inside a single-quoted string.
                        Some('"') => out.push_str("\\\""),
                        Some(inner) => out.push(inner),
                    }
                }
                out.push('"');
            }
            _ if c.is_ascii_alphabetic() => {
                let mut word = String::new();
                word.push(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match word.as_str() {
                    "True" => out.push_str("true"),
                    "False" => out.push_str("false"),
                    "None" => out.push_str("null"),
                    _ => out.push_str(&word),
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Parser for candidate metadata headers
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataParser;

impl MetadataParser {
    /// Create a parser
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse a full candidate file (header plus source) for `library`.
    ///
    /// # Errors
    ///
    /// Returns an error when `id` or the quality block is missing or
    /// malformed. The caller is expected to skip the candidate and
    /// continue; a parse failure never aborts a batch.
    pub fn parse(&self, text: &str, library: &str) -> Result<CandidateRecord> {
        let (header, source) = split_header(text);

        let mut id: Option<u64> = None;
        let mut prompt = String::new();
        let mut combination = String::new();
        let mut raw_score = 0.0_f64;
        let mut status = CandidateStatus::Pending;
        let mut quality_text: Option<String> = None;

        // Free-text fields may continue over several lines; continuation
        // lines attach to whichever field was seen last.
        let mut continuation: Option<&mut String> = None;

        let mut lines = header.lines();
        while let Some(line) = lines.next() {
            let Some(caps) = FIELD_REGEX.captures(line) else {
                if let Some(target) = continuation.as_mut() {
                    if !line.trim().is_empty() {
                        if !target.is_empty() {
                            target.push('\n');
                        }
                        target.push_str(line.trim());
                    }
                }
                continue;
            };
            let value = caps["value"].trim().to_string();
            continuation = None;
            match &caps["key"] {
                "id" => {
                    id = Some(value.parse().map_err(|_| Error::MalformedField {
                        field: "id",
                        value: value.clone(),
                    })?);
                }
                "prompt" => {
                    prompt = value;
                    continuation = Some(&mut prompt);
                }
                "combination" => {
                    combination = value;
                    continuation = Some(&mut combination);
                }
                "score" => {
                    raw_score = value.parse().map_err(|_| Error::MalformedField {
                        field: "score",
                        value: value.clone(),
                    })?;
                }
                "status" => {
                    status =
                        CandidateStatus::from_wire(&value).ok_or_else(|| Error::MalformedField {
                            field: "status",
                            value: value.clone(),
                        })?;
                }
                "quality" => {
                    // The block may continue past this line; take the rest
                    // of the header verbatim.
                    let mut block = value;
                    for rest in lines.by_ref() {
                        block.push('\n');
                        block.push_str(rest);
                    }
                    quality_text = Some(block);
                }
                _ => unreachable!("field regex admits only known keys"),
            }
        }

        let id = id.ok_or(Error::MissingField("id"))?;
        let quality_text = quality_text.ok_or(Error::MissingField("quality"))?;
        let wire: QualityWire = serde_json::from_str(&normalize_json(&quality_text))
            .map_err(|e| Error::MalformedQuality(e.to_string()))?;

        let mut record = CandidateRecord::new(id, library, wire.into())
            .with_provenance(prompt, combination)
            .with_source(source);
        record.raw_score = raw_score;
        record.status = status;
        Ok(record)
    }
}

/// Render a candidate back to the wire format.
///
/// Emits the recomputed score and density (per the curation contract,
/// never the stale inbound values), the current status, and the canonical
/// sorted-array branch form, followed by the untouched source payload.
/// Unusable candidates were never scored and emit a zero score.
#[must_use]
pub fn render_record(record: &CandidateRecord) -> String {
    let density = record.quality.recomputed_density();
    let score = if record.status == CandidateStatus::Unusable {
        0.0
    } else {
        record.effective_score()
    };
    let branches: Vec<&String> = record.quality.unique_branches.iter().collect();

    // Serializing plain vectors of strings cannot fail.
    #[allow(clippy::unwrap_used)]
    let quality = serde_json::json!({
        "density": density,
        "unique_branches": branches,
        "library_calls": record.quality.library_calls,
        "critical_calls": record.quality.critical_calls,
        "visited": record.quality.visited,
    });

    let mut out = String::new();
    out.push_str(&format!("id: {}\n", record.id));
    out.push_str(&format!("prompt: {}\n", record.prompt));
    out.push_str(&format!("combination: {}\n", record.combination));
    out.push_str(&format!("score: {score}\n"));
    out.push_str(&format!("status: {}\n", record.status));
    out.push_str(&format!("quality: {quality}\n"));
    out.push('\n');
    out.push_str(&record.source);
    out
}
