//! Error types shared by the simulation.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MotError {
    // Configuration errors
    #[error("Invalid configuration: `{parameter}` {reason}")]
    InvalidConfiguration {
        parameter: &'static str,
        reason: String,
    },

    // File I/O errors
    #[error("Failed to read configuration file '{path}': {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML configuration '{path}': {source}")]
    YamlParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse JSON configuration '{path}': {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write output '{path}': {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Averaging errors
    #[error("Run {run} has shape mismatch in {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        run: usize,
        what: &'static str,
        expected: usize,
        found: usize,
    },
}

impl MotError {
    pub(crate) fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        MotError::InvalidConfiguration {
            parameter,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MotError>;
