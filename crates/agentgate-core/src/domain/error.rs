//! Crate-wide error taxonomy for agentgate.
//!
//! Each subsystem owns a narrow error enum; [`GateError`] folds them together
//! for callers that drive the whole pipeline. Only [`ConfigError`] is fatal to
//! an invocation; every other variant is degraded into a still-useful
//! assessment by the pipeline.

use std::time::Duration;

use crate::audit::AuditError;
use crate::config::ConfigError;
use crate::context::ProviderError;
use crate::index::IndexError;
use crate::learning::StoreError;
use crate::source::ParseError;

/// agentgate errors.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("history store error: {0}")]
    Store(#[from] StoreError),

    #[error("context provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("codebase index error: {0}")]
    Index(#[from] IndexError),

    #[error("audit log error: {0}")]
    Audit(#[from] AuditError),

    #[error("pipeline stage failed: {0}")]
    Pipeline(String),

    #[error("assessment timed out after {0:?}")]
    Timeout(Duration),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GateError {
    /// Whether this error must abort the invocation instead of degrading.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type for agentgate operations.
pub type Result<T> = std::result::Result<T, GateError>;
