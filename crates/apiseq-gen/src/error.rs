//! Error types for apiseq-gen

use thiserror::Error;

/// Result type alias for apiseq-gen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing candidate metadata
#[derive(Debug, Error)]
pub enum Error {
    /// A required header field is absent
    #[error("Missing required header field: {0}")]
    MissingField(&'static str),

    /// A header field is present but cannot be parsed
    #[error("Malformed header field `{field}`: {value}")]
    MalformedField {
        /// Field name
        field: &'static str,
        /// The offending text
        value: String,
    },

    /// The quality block is not a well-formed record
    #[error("Malformed quality block: {0}")]
    MalformedQuality(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
