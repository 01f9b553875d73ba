//! Architectural conventions expressed as declarative capability rules.

use regex::Regex;
use tracing::warn;

use super::locate;
use crate::context::{CapabilityRule, OrganizationalContext};
use crate::domain::{AnalyzerCategory, AnalyzerReport, CodeIssue, IssueKind, Severity};
use crate::source::{SourceModel, TypeDecl, TypeKind};

/// A rule miss, before it is turned into an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub type_name: String,
    pub line: u32,
    pub severity: Severity,
    pub message: String,
}

/// Evaluate every rule against every class in `model`.
pub fn violations(model: &SourceModel, ctx: &OrganizationalContext) -> Vec<Violation> {
    let mut out = Vec::new();
    for rule in &ctx.architecture_rules {
        let re = match Regex::new(&rule.name_pattern) {
            Ok(re) => re,
            Err(e) => {
                warn!(pattern = %rule.name_pattern, error = %e, "skipping invalid architecture rule");
                continue;
            }
        };
        for decl in model
            .types
            .iter()
            .filter(|t| matches!(t.kind, TypeKind::Class | TypeKind::Record))
            .filter(|t| re.is_match(&t.name))
        {
            check_rule(rule, decl, &mut out);
        }
    }
    out
}

fn check_rule(rule: &CapabilityRule, decl: &TypeDecl, out: &mut Vec<Violation>) {
    let mut push = |severity, message: String, line| {
        out.push(Violation {
            type_name: decl.name.clone(),
            line,
            severity,
            message,
        })
    };
    let line = decl.span.start_line;

    if !rule.required_bases.is_empty() && !rule.required_bases.iter().any(|b| decl.has_base(b)) {
        push(
            Severity::High,
            format!(
                "'{}' must derive from one of: {}",
                decl.name,
                rule.required_bases.join(", ")
            ),
            line,
        );
    }

    for capability in &rule.required_capabilities {
        if !decl.has_base(capability) {
            push(
                Severity::Medium,
                format!("'{}' does not implement '{capability}'", decl.name),
                line,
            );
        }
    }

    if rule.min_constructor_params > 0 {
        if decl.constructors.is_empty() {
            push(
                Severity::Medium,
                format!(
                    "'{}' has no constructor; expected at least {} injected collaborator(s)",
                    decl.name, rule.min_constructor_params
                ),
                line,
            );
        }
        for ctor in &decl.constructors {
            if ctor.params.len() < rule.min_constructor_params {
                push(
                    Severity::Medium,
                    format!(
                        "constructor of '{}' takes {} parameter(s); expected at least {}",
                        decl.name,
                        ctor.params.len(),
                        rule.min_constructor_params
                    ),
                    ctor.span.start_line,
                );
            }
        }
    }
}

pub fn analyze(model: &SourceModel, ctx: &OrganizationalContext) -> AnalyzerReport {
    let issues = violations(model, ctx)
        .into_iter()
        .map(|v| {
            CodeIssue::new(
                AnalyzerCategory::Architecture,
                IssueKind::Architecture,
                v.severity,
                v.message,
                locate(&model.file_name, v.line, Some(v.type_name)),
            )
        })
        .collect();
    AnalyzerReport::from_issues(AnalyzerCategory::Architecture, issues)
}
