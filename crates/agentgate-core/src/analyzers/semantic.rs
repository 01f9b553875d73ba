//! Semantic and style checks: naming, complexity, length, magic literals, docs.

use std::sync::OnceLock;

use regex::Regex;

use super::locate;
use crate::context::OrganizationalContext;
use crate::domain::{AnalyzerCategory, AnalyzerReport, CodeIssue, IssueKind, Severity};
use crate::source::{SourceModel, TypeKind};

/// Shortest literal, in characters, the semantic pass reports as magic.
pub const MAGIC_LITERAL_MIN_CHARS: usize = 6;

fn config_key_shape() -> Option<&'static Regex> {
    static SHAPE: OnceLock<Option<Regex>> = OnceLock::new();
    SHAPE
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*((\.|:|__)[A-Za-z0-9_-]+)+$").ok())
        .as_ref()
}

/// Upper-case first letter and no underscores.
pub fn is_pascal_case(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) && !name.contains('_')
}

/// Dotted, colon or double-underscore key shapes, or a configured prefix.
pub fn is_config_key(literal: &str, ctx: &OrganizationalContext) -> bool {
    if literal.contains(char::is_whitespace) {
        return false;
    }
    ctx.config_key_prefixes
        .iter()
        .any(|p| !p.is_empty() && literal.starts_with(p.as_str()))
        || config_key_shape().is_some_and(|re| re.is_match(literal))
}

/// A literal of at least `min_chars` characters that is neither a key nor a status word.
pub fn is_magic_literal(literal: &str, min_chars: usize, ctx: &OrganizationalContext) -> bool {
    literal.trim().chars().count() >= min_chars
        && !is_config_key(literal, ctx)
        && !ctx.is_status_word(literal.trim())
}

/// `value > 2 * limit`, saturating for limits near `u32::MAX`.
fn beyond_twice(value: u32, limit: u32) -> bool {
    value > limit.saturating_mul(2)
}

pub fn analyze(model: &SourceModel, ctx: &OrganizationalContext) -> AnalyzerReport {
    let mut issues = Vec::new();
    let file = &model.file_name;
    let issue = |kind, severity, message: String, line, symbol: String| {
        CodeIssue::new(
            AnalyzerCategory::Semantic,
            kind,
            severity,
            message,
            locate(file, line, Some(symbol)),
        )
    };

    for decl in &model.types {
        let line = decl.span.start_line;
        if decl.kind == TypeKind::Class && decl.is_public {
            if let Some(suffix) = ctx.naming.class_suffix.as_deref() {
                if !decl.name.ends_with(suffix) {
                    issues.push(issue(
                        IssueKind::NamingConvention,
                        Severity::Medium,
                        format!("class '{}' does not end with '{suffix}'", decl.name),
                        line,
                        decl.name.clone(),
                    ));
                }
            }
        }
        if ctx.naming.pascal_case_types && !is_pascal_case(&decl.name) {
            issues.push(issue(
                IssueKind::NamingConvention,
                Severity::Low,
                format!("type '{}' is not PascalCase", decl.name),
                line,
                decl.name.clone(),
            ));
        }
        let lines = decl.span.line_count();
        if lines > ctx.max_class_lines {
            issues.push(issue(
                IssueKind::Complexity,
                Severity::Medium,
                format!(
                    "type '{}' spans {lines} lines (max {})",
                    decl.name, ctx.max_class_lines
                ),
                line,
                decl.name.clone(),
            ));
        }
        if ctx.require_docs && decl.is_public && !decl.has_doc_comment {
            issues.push(issue(
                IssueKind::Documentation,
                Severity::Low,
                format!("public type '{}' has no documentation comment", decl.name),
                line,
                decl.name.clone(),
            ));
        }

        for method in &decl.methods {
            let symbol = format!("{}.{}", decl.name, method.name);
            let line = method.span.start_line;
            if ctx.naming.pascal_case_methods && !is_pascal_case(&method.name) {
                issues.push(issue(
                    IssueKind::NamingConvention,
                    Severity::Low,
                    format!("method '{}' is not PascalCase", method.name),
                    line,
                    symbol.clone(),
                ));
            }
            if ctx.require_docs && method.is_public && !method.has_doc_comment {
                issues.push(issue(
                    IssueKind::Documentation,
                    Severity::Low,
                    format!("public method '{}' has no documentation comment", method.name),
                    line,
                    symbol.clone(),
                ));
            }
        }
    }

    for (owner, method) in model.all_methods() {
        let symbol = match owner {
            Some(owner) => format!("{owner}.{}", method.name),
            None => method.name.clone(),
        };
        let line = method.span.start_line;

        let complexity = method.cyclomatic_complexity();
        if complexity > ctx.max_complexity {
            let severity = if beyond_twice(complexity, ctx.max_complexity) {
                Severity::Critical
            } else {
                Severity::High
            };
            issues.push(issue(
                IssueKind::Complexity,
                severity,
                format!(
                    "'{}' has cyclomatic complexity {complexity} (max {})",
                    method.name, ctx.max_complexity
                ),
                line,
                symbol.clone(),
            ));
        }

        let lines = method.span.line_count();
        if lines > ctx.max_method_lines {
            let severity = if beyond_twice(lines, ctx.max_method_lines) {
                Severity::High
            } else {
                Severity::Medium
            };
            issues.push(issue(
                IssueKind::MethodLength,
                severity,
                format!(
                    "'{}' is {lines} lines long (max {})",
                    method.name, ctx.max_method_lines
                ),
                line,
                symbol,
            ));
        }
    }

    for literal in &model.literals {
        if is_magic_literal(&literal.value, MAGIC_LITERAL_MIN_CHARS, ctx) {
            issues.push(CodeIssue::new(
                AnalyzerCategory::Semantic,
                IssueKind::MagicLiteral,
                Severity::Low,
                format!("magic string literal \"{}\"", literal.value),
                locate(file, literal.line, model.enclosing_symbol(literal.line)),
            ));
        }
    }

    AnalyzerReport::from_issues(AnalyzerCategory::Semantic, issues)
}
