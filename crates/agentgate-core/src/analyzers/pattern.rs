//! Pattern-vs-history analyzer.

use crate::context::OrganizationalContext;
use crate::domain::{AnalyzerCategory, AnalyzerReport};
use crate::learning::{signatures, LearnedPatterns};
use crate::source::SourceModel;

/// Score the candidate against signatures of frequently rejected kinds.
///
/// An empty history yields a clean report.
pub fn analyze(
    model: &SourceModel,
    ctx: &OrganizationalContext,
    learned: &LearnedPatterns,
) -> AnalyzerReport {
    AnalyzerReport::from_issues(
        AnalyzerCategory::Pattern,
        signatures::check(model, ctx, learned),
    )
}
