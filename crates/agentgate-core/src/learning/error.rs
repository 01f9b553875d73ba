//! Error types for the approval history store.

use std::path::PathBuf;

/// Errors produced by the pattern learning store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("history file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("history file {path} is corrupt at line {line}: {reason}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to replace history file {path}: {reason}")]
    Persist { path: PathBuf, reason: String },
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
