//! Error types for apiseq-runner

use thiserror::Error;

/// Result type alias for apiseq-runner operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during curation
#[derive(Debug, Error)]
pub enum Error {
    /// Candidate metadata failed to parse
    #[error("Metadata error: {0}")]
    Metadata(#[from] apiseq_gen::Error),

    /// Configuration file error
    #[error("Config error: {0}")]
    ConfigError(#[from] serde_yaml::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A candidate was submitted for the wrong library's selector
    #[error("Library mismatch: selector owns `{expected}`, candidate targets `{actual}`")]
    LibraryMismatch {
        /// Library the selector owns
        expected: String,
        /// Library the candidate targets
        actual: String,
    },

    /// A terminal candidate was re-submitted for evaluation
    #[error("Candidate {id} is already in terminal state {status}")]
    AlreadyTerminal {
        /// Candidate id
        id: u64,
        /// The terminal state it holds
        status: String,
    },
}
