//! Tightened signatures for issue kinds that keep getting rejected.
//!
//! Each learned kind is re-checked with a stricter version of the analyzer
//! rule that produced it. Every hit becomes a `Pattern` issue.

use crate::analyzers::{architecture, dependency, locate, semantic};
use crate::context::OrganizationalContext;
use crate::domain::{AnalyzerCategory, CodeIssue, IssueKind, Location, Severity};
use crate::source::{SourceModel, TypeKind};

use super::LearnedPatterns;

/// Shortest literal the magic-literal signature reports.
pub const LEARNED_LITERAL_MIN_CHARS: usize = 3;

/// `value` is above three quarters of `limit`.
fn near_limit(value: u32, limit: u32) -> bool {
    u64::from(value) * 4 > u64::from(limit) * 3
}

/// Signature hits for every learned kind, in learned-kind order.
pub fn check(
    model: &SourceModel,
    ctx: &OrganizationalContext,
    learned: &LearnedPatterns,
) -> Vec<CodeIssue> {
    let mut issues = Vec::new();
    for &(kind, count) in &learned.kinds {
        let severity = if count >= learned.high_severity_rejections {
            Severity::High
        } else {
            Severity::Medium
        };
        for (detail, location) in hits(kind, model, ctx) {
            issues.push(CodeIssue::new(
                AnalyzerCategory::Pattern,
                IssueKind::Pattern,
                severity,
                format!("matches frequently rejected {kind} pattern ({count} rejections): {detail}"),
                location,
            ));
        }
    }
    issues
}

fn hits(kind: IssueKind, model: &SourceModel, ctx: &OrganizationalContext) -> Vec<(String, Location)> {
    let file = model.file_name.as_str();
    let mut out = Vec::new();
    match kind {
        IssueKind::MagicLiteral => {
            for lit in &model.literals {
                if semantic::is_magic_literal(&lit.value, LEARNED_LITERAL_MIN_CHARS, ctx) {
                    out.push((
                        format!("string literal \"{}\"", lit.value),
                        locate(file, lit.line, model.enclosing_symbol(lit.line)),
                    ));
                }
            }
        }
        IssueKind::Complexity => {
            for (owner, method) in model.all_methods() {
                let complexity = method.cyclomatic_complexity();
                if near_limit(complexity, ctx.max_complexity) {
                    out.push((
                        format!("'{}' has complexity {complexity}", method.name),
                        locate(file, method.span.start_line, Some(qualified(owner, &method.name))),
                    ));
                }
            }
            for decl in &model.types {
                let lines = decl.span.line_count();
                if near_limit(lines, ctx.max_class_lines) {
                    out.push((
                        format!("type '{}' spans {lines} lines", decl.name),
                        locate(file, decl.span.start_line, Some(decl.name.clone())),
                    ));
                }
            }
        }
        IssueKind::MethodLength => {
            for (owner, method) in model.all_methods() {
                let lines = method.span.line_count();
                if near_limit(lines, ctx.max_method_lines) {
                    out.push((
                        format!("'{}' is {lines} lines long", method.name),
                        locate(file, method.span.start_line, Some(qualified(owner, &method.name))),
                    ));
                }
            }
        }
        IssueKind::NamingConvention => {
            for decl in &model.types {
                let line = decl.span.start_line;
                let suffix_miss = decl.kind == TypeKind::Class
                    && ctx
                        .naming
                        .class_suffix
                        .as_deref()
                        .is_some_and(|s| !decl.name.ends_with(s));
                if suffix_miss || !semantic::is_pascal_case(&decl.name) {
                    out.push((
                        format!("type name '{}'", decl.name),
                        locate(file, line, Some(decl.name.clone())),
                    ));
                }
            }
            for (owner, method) in model.all_methods() {
                if !semantic::is_pascal_case(&method.name) {
                    out.push((
                        format!("method name '{}'", method.name),
                        locate(file, method.span.start_line, Some(qualified(owner, &method.name))),
                    ));
                }
            }
        }
        IssueKind::Documentation => {
            for decl in model.types.iter().filter(|t| t.is_public && !t.has_doc_comment) {
                out.push((
                    format!("undocumented public type '{}'", decl.name),
                    locate(file, decl.span.start_line, Some(decl.name.clone())),
                ));
            }
            for (owner, method) in model
                .all_methods()
                .filter(|(_, m)| m.is_public && !m.has_doc_comment)
            {
                out.push((
                    format!("undocumented public method '{}'", method.name),
                    locate(file, method.span.start_line, Some(qualified(owner, &method.name))),
                ));
            }
        }
        IssueKind::Dependency => {
            for import in &model.imports {
                if dependency::looks_deprecated(&import.path, ctx) {
                    out.push((
                        format!("import '{}'", import.path),
                        locate(file, import.line, None),
                    ));
                }
            }
        }
        IssueKind::Architecture => {
            for v in architecture::violations(model, ctx) {
                out.push((v.message, locate(file, v.line, Some(v.type_name))));
            }
        }
        IssueKind::Pattern | IssueKind::Unparsable | IssueKind::Pipeline => {}
    }
    out
}

fn qualified(owner: Option<&str>, name: &str) -> String {
    match owner {
        Some(owner) => format!("{owner}.{name}"),
        None => name.to_string(),
    }
}
