//! Analyzer reports and the aggregated validation result.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::issue::{AnalyzerCategory, CodeIssue, IssueKind, Location, Severity};

/// Score every analyzer starts from.
pub const MAX_SCORE: f64 = 100.0;

/// Severity-weighted score for a set of findings: 100 minus penalties, floored at 0.
pub fn score_issues(issues: &[CodeIssue]) -> f64 {
    let penalty: f64 = issues.iter().map(|i| i.severity.penalty()).sum();
    (MAX_SCORE - penalty).clamp(0.0, MAX_SCORE)
}

/// Output of one analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerReport {
    pub category: AnalyzerCategory,
    /// 0–100, derived from `issues` by [`score_issues`].
    pub score: f64,
    pub issues: Vec<CodeIssue>,
}

impl AnalyzerReport {
    pub fn from_issues(category: AnalyzerCategory, issues: Vec<CodeIssue>) -> Self {
        Self {
            category,
            score: score_issues(&issues),
            issues,
        }
    }

    /// A report with no findings (score exactly 100).
    pub fn clean(category: AnalyzerCategory) -> Self {
        Self::from_issues(category, Vec::new())
    }
}

/// Aggregated quality verdict for one candidate.
///
/// # Invariants
///
/// `overall_quality` is the unweighted mean of the four sub-scores, each in
/// `[0, 100]`. Build through [`ValidationResult::from_reports`],
/// [`ValidationResult::unparsable`] or [`ValidationResult::failed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub semantic: f64,
    pub pattern: f64,
    pub dependency: f64,
    pub architecture: f64,
    pub overall_quality: f64,
    pub issues: Vec<CodeIssue>,
    pub recommendations: Vec<String>,
}

impl ValidationResult {
    pub fn from_reports(
        semantic: AnalyzerReport,
        pattern: AnalyzerReport,
        dependency: AnalyzerReport,
        architecture: AnalyzerReport,
    ) -> Self {
        let scores = [
            clamp_score(semantic.score),
            clamp_score(pattern.score),
            clamp_score(dependency.score),
            clamp_score(architecture.score),
        ];
        let overall_quality = scores.iter().sum::<f64>() / scores.len() as f64;

        let mut issues = semantic.issues;
        issues.extend(pattern.issues);
        issues.extend(dependency.issues);
        issues.extend(architecture.issues);

        let recommendations = recommendations_for(&issues);

        Self {
            semantic: scores[0],
            pattern: scores[1],
            dependency: scores[2],
            architecture: scores[3],
            overall_quality,
            issues,
            recommendations,
        }
    }

    /// Worst-case result for a candidate that could not be parsed.
    pub fn unparsable(file: &str, reason: &str, line: Option<u32>) -> Self {
        let location = match line {
            Some(line) => Location::at(file, line),
            None => Location::file(file),
        };
        Self::zeroed(CodeIssue::new(
            AnalyzerCategory::Pipeline,
            IssueKind::Unparsable,
            Severity::Critical,
            format!("candidate is unparsable: {reason}"),
            location,
        ))
    }

    /// Worst-case result for an assessment whose pipeline failed.
    pub fn failed(file: &str, reason: &str) -> Self {
        Self::zeroed(CodeIssue::new(
            AnalyzerCategory::Pipeline,
            IssueKind::Pipeline,
            Severity::Critical,
            format!("pipeline error: {reason}"),
            Location::file(file),
        ))
    }

    fn zeroed(issue: CodeIssue) -> Self {
        let issues = vec![issue];
        let recommendations = recommendations_for(&issues);
        Self {
            semantic: 0.0,
            pattern: 0.0,
            dependency: 0.0,
            architecture: 0.0,
            overall_quality: 0.0,
            issues,
            recommendations,
        }
    }

    /// Number of findings at exactly `severity`.
    pub fn count_at(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// Highest severity present, if any.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.issues.iter().map(|i| i.severity).max()
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, MAX_SCORE)
}

/// One recommendation per distinct finding kind, in a stable order.
fn recommendations_for(issues: &[CodeIssue]) -> Vec<String> {
    let kinds: BTreeSet<IssueKind> = issues.iter().map(|i| i.kind).collect();
    kinds
        .into_iter()
        .map(|kind| {
            match kind {
                IssueKind::NamingConvention => {
                    "Rename declarations to follow the organization's naming conventions"
                }
                IssueKind::Complexity => {
                    "Split complex methods and large types into smaller units"
                }
                IssueKind::MethodLength => "Extract helper methods to shorten long methods",
                IssueKind::MagicLiteral => {
                    "Move string literals into named constants or configuration"
                }
                IssueKind::Documentation => "Add documentation comments to public declarations",
                IssueKind::Architecture => {
                    "Align the type with the required base type, capabilities, and constructor injection"
                }
                IssueKind::Dependency => {
                    "Remove references to deprecated namespaces and break dependency cycles"
                }
                IssueKind::Pattern => {
                    "Review findings matching patterns that were previously rejected"
                }
                IssueKind::Unparsable => "Fix syntax errors so the candidate can be analyzed",
                IssueKind::Pipeline => "Re-run the assessment once the pipeline failure is resolved",
            }
            .to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(category: AnalyzerCategory, severity: Severity) -> CodeIssue {
        CodeIssue::new(
            category,
            IssueKind::Complexity,
            severity,
            "test",
            Location::file("a.cs"),
        )
    }

    #[test]
    fn test_clean_report_scores_exactly_100() {
        let r = AnalyzerReport::clean(AnalyzerCategory::Semantic);
        assert_eq!(r.score, 100.0);
    }

    #[test]
    fn test_score_floor_is_zero() {
        let issues: Vec<_> = (0..8)
            .map(|_| issue(AnalyzerCategory::Semantic, Severity::Critical))
            .collect();
        assert_eq!(score_issues(&issues), 0.0);
    }

    #[test]
    fn test_mixed_penalties() {
        let issues = vec![
            issue(AnalyzerCategory::Semantic, Severity::High),
            issue(AnalyzerCategory::Semantic, Severity::Medium),
            issue(AnalyzerCategory::Semantic, Severity::Low),
            issue(AnalyzerCategory::Semantic, Severity::Info),
        ];
        assert_eq!(score_issues(&issues), 83.0);
    }

    #[test]
    fn test_overall_is_mean_of_four() {
        let v = ValidationResult::from_reports(
            AnalyzerReport::from_issues(
                AnalyzerCategory::Semantic,
                vec![issue(AnalyzerCategory::Semantic, Severity::Critical)],
            ),
            AnalyzerReport::clean(AnalyzerCategory::Pattern),
            AnalyzerReport::clean(AnalyzerCategory::Dependency),
            AnalyzerReport::from_issues(
                AnalyzerCategory::Architecture,
                vec![issue(AnalyzerCategory::Architecture, Severity::High)],
            ),
        );
        assert_eq!(v.semantic, 80.0);
        assert_eq!(v.architecture, 90.0);
        assert_eq!(v.overall_quality, (80.0 + 100.0 + 100.0 + 90.0) / 4.0);
        assert_eq!(v.issues.len(), 2);
        assert_eq!(v.recommendations.len(), 1);
    }

    #[test]
    fn test_unparsable_is_zero_with_single_critical() {
        let v = ValidationResult::unparsable("bad.cs", "unbalanced braces", Some(3));
        assert_eq!(v.overall_quality, 0.0);
        assert_eq!(v.issues.len(), 1);
        assert_eq!(v.issues[0].kind, IssueKind::Unparsable);
        assert_eq!(v.issues[0].severity, Severity::Critical);
        assert_eq!(v.issues[0].location.line, Some(3));
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        let mut semantic = AnalyzerReport::clean(AnalyzerCategory::Semantic);
        semantic.score = 140.0;
        let mut pattern = AnalyzerReport::clean(AnalyzerCategory::Pattern);
        pattern.score = -5.0;
        let v = ValidationResult::from_reports(
            semantic,
            pattern,
            AnalyzerReport::clean(AnalyzerCategory::Dependency),
            AnalyzerReport::clean(AnalyzerCategory::Architecture),
        );
        assert_eq!(v.semantic, 100.0);
        assert_eq!(v.pattern, 0.0);
        assert_eq!(v.overall_quality, 75.0);
    }
}
