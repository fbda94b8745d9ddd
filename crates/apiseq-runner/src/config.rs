//! Curation configuration
//!
//! Loaded from YAML; every field has a default so a config file only
//! needs to name what it overrides.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default retained-set floor per library
pub const DEFAULT_MIN_CORPUS: usize = 4;

fn default_min_corpus() -> usize {
    DEFAULT_MIN_CORPUS
}

fn default_workers() -> usize {
    num_cpus::get().min(4)
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationConfig {
    /// Minimum retained candidates per library before the acceptance
    /// floor stops applying
    #[serde(default = "default_min_corpus")]
    pub min_corpus: usize,
    /// Worker threads for across-library parallelism
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Write rejected candidates to a sidecar directory instead of
    /// dropping them
    #[serde(default)]
    pub keep_rejected: bool,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            min_corpus: default_min_corpus(),
            workers: default_workers(),
            keep_rejected: false,
        }
    }
}

impl CurationConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Serialize to YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
