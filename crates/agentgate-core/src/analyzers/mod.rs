//! The four quality analyzers.
//!
//! Each analyzer is a pure function from a [`SourceModel`] and the
//! [`OrganizationalContext`] (plus, for some, a collaborator) to an
//! [`AnalyzerReport`]. None of them mutate shared state, so one assessment
//! may run them in any order.

pub mod architecture;
pub mod dependency;
pub mod pattern;
pub mod semantic;

use crate::context::OrganizationalContext;
use crate::domain::{Location, ValidationResult};
use crate::index::CodebaseIndex;
use crate::learning::LearnedPatterns;
use crate::source::SourceModel;

pub(crate) fn locate(file: &str, line: u32, symbol: Option<String>) -> Location {
    let loc = Location::at(file, line);
    match symbol {
        Some(symbol) => loc.with_symbol(symbol),
        None => loc,
    }
}

/// Run every analyzer and fold the reports into a [`ValidationResult`].
///
/// Without an index the dependency analyzer skips cycle detection.
pub fn analyze_all(
    model: &SourceModel,
    ctx: &OrganizationalContext,
    learned: &LearnedPatterns,
    index: Option<&CodebaseIndex>,
) -> ValidationResult {
    ValidationResult::from_reports(
        semantic::analyze(model, ctx),
        pattern::analyze(model, ctx, learned),
        dependency::analyze(model, ctx, index),
        architecture::analyze(model, ctx),
    )
}
