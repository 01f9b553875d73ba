//! Domain models for agentgate.
//!
//! Canonical definitions for the core entities:
//! - `CodeIssue`: a single analyzer finding
//! - `ValidationResult`: aggregated quality scores for a candidate
//! - `Candidate` / `CompleteAssessment`: pipeline input and terminal output

pub mod assessment;
pub mod error;
pub mod issue;
pub mod validation;

pub use assessment::{
    Candidate, CompleteAssessment, EXIT_APPROVED, EXIT_BLOCKED, EXIT_CONFIG_ERROR, EXIT_REJECTED,
};
pub use error::{GateError, Result};
pub use issue::{AnalyzerCategory, CodeIssue, IssueKind, Location, Severity};
pub use validation::{score_issues, AnalyzerReport, ValidationResult, MAX_SCORE};
