//! Dependency and coupling checks over imports.

use super::locate;
use crate::context::OrganizationalContext;
use crate::domain::{AnalyzerCategory, AnalyzerReport, CodeIssue, IssueKind, Severity};
use crate::index::CodebaseIndex;
use crate::source::SourceModel;

/// Depth cap for the reverse-import cycle walk.
pub const MAX_CYCLE_DEPTH: usize = 10;

const LEGACY_SEGMENTS: [&str; 3] = ["legacy", "deprecated", "obsolete"];

/// Configured deprecated prefix, or a `Legacy`/`Deprecated`/`Obsolete` segment.
pub fn is_deprecated_import(path: &str, ctx: &OrganizationalContext) -> bool {
    let under_prefix = ctx.deprecated_namespaces.iter().any(|prefix| {
        path == prefix
            || path
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('/'))
    });
    under_prefix
        || path
            .split(['.', '/'])
            .any(|seg| LEGACY_SEGMENTS.iter().any(|l| seg.eq_ignore_ascii_case(l)))
}

/// Looser test used when re-checking learned patterns: any mention of a
/// legacy marker anywhere in the path.
pub fn looks_deprecated(path: &str, ctx: &OrganizationalContext) -> bool {
    let lower = path.to_ascii_lowercase();
    is_deprecated_import(path, ctx) || LEGACY_SEGMENTS.iter().any(|l| lower.contains(l))
}

pub fn analyze(
    model: &SourceModel,
    ctx: &OrganizationalContext,
    index: Option<&CodebaseIndex>,
) -> AnalyzerReport {
    let mut issues = Vec::new();
    let file = &model.file_name;

    for import in &model.imports {
        if is_deprecated_import(&import.path, ctx) {
            issues.push(CodeIssue::new(
                AnalyzerCategory::Dependency,
                IssueKind::Dependency,
                Severity::Medium,
                format!("import of deprecated namespace '{}'", import.path),
                locate(file, import.line, None),
            ));
        }
    }

    if model.imports.len() > ctx.max_imports {
        issues.push(CodeIssue::new(
            AnalyzerCategory::Dependency,
            IssueKind::Dependency,
            Severity::Low,
            format!(
                "{} imports exceed the limit of {}",
                model.imports.len(),
                ctx.max_imports
            ),
            locate(file, model.imports[0].line, None),
        ));
    }

    if let (Some(own), Some(index)) = (model.namespace.as_deref(), index) {
        for import in model.imports.iter().filter(|i| i.path != own) {
            if index.reaches_back(own, &import.path, MAX_CYCLE_DEPTH) {
                issues.push(CodeIssue::new(
                    AnalyzerCategory::Dependency,
                    IssueKind::Dependency,
                    Severity::High,
                    format!(
                        "import of '{}' forms a cycle back to '{own}'",
                        import.path
                    ),
                    locate(file, import.line, None),
                ));
            }
        }
    }

    AnalyzerReport::from_issues(AnalyzerCategory::Dependency, issues)
}
