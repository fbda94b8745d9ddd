//! Error types for apiseq-report

use thiserror::Error;

/// Result type alias for apiseq-report operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while persisting or reporting
#[derive(Debug, Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A stored candidate failed to reparse
    #[error("Corrupt corpus file {file}: {reason}")]
    CorruptEntry {
        /// File that failed
        file: String,
        /// Parse failure detail
        reason: String,
    },
}
