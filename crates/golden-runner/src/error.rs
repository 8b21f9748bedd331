//! Error types for the golden harness
//!
//! Only setup problems are errors. Per-test problems (launch failures,
//! missing references, mismatches) are verdicts, see [`crate::compare`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a run before (or instead of) executing tests
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The log directory does not exist and could not be created
    #[error("Error creating directory {}: {source}", .path.display())]
    LogDirCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A stale entry in the log directory could not be removed
    #[error("Error clearing directory {}: {source}", .path.display())]
    LogDirClear {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The runtime probe could not be launched or did not exit cleanly
    #[error(
        "Error calling {runtime} ({reason}).\nPlease make sure that {runtime} executable is in the current PATH."
    )]
    RuntimeUnavailable { runtime: String, reason: String },

    /// Config file could not be read
    #[error("Failed to read config '{}': {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Config file is not valid TOML for [`crate::HarnessConfig`]
    #[error("Failed to parse config '{}': {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Config values that cannot describe a test layout
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The report stream itself failed (e.g. stdout closed)
    #[error("Failed to write report: {0}")]
    Report(#[source] io::Error),
}

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;
