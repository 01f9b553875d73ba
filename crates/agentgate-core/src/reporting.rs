use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::{CompleteAssessment, Severity};

/// Version of the JSON report layout.
pub const REPORT_SCHEMA_VERSION: &str = "1.0";

/// Canonical assessment report written for CI and review tooling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssessmentReportArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub exit_code: i32,
    pub assessment: CompleteAssessment,
}

impl AssessmentReportArtifact {
    pub fn new(assessment: &CompleteAssessment, generated_at: DateTime<Utc>) -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            generated_at,
            exit_code: assessment.exit_code(),
            assessment: assessment.clone(),
        }
    }
}

/// Write the report in pretty JSON format.
pub fn write_assessment_json(path: &Path, artifact: &AssessmentReportArtifact) -> Result<()> {
    let content =
        serde_json::to_string_pretty(artifact).context("serialize assessment report")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Render a markdown summary for PR comments and review queues.
pub fn render_assessment_md(assessment: &CompleteAssessment) -> String {
    let v = &assessment.validation;
    let r = &assessment.risk;
    let mut out = String::new();
    out.push_str(&format!("# Assessment: {}\n\n", assessment.candidate));
    out.push_str(&format!("{}\n\n", assessment.summary));

    out.push_str("## Quality\n");
    out.push_str(&format!(
        "- overall: {:.1}\n- semantic: {:.1}\n- pattern: {:.1}\n- dependency: {:.1}\n- architecture: {:.1}\n\n",
        v.overall_quality, v.semantic, v.pattern, v.dependency, v.architecture
    ));

    out.push_str("## Risk\n");
    out.push_str(&format!(
        "- category: {}\n- level: {}\n- security: {:.1}\n- quality: {:.1}\n- compliance: {:.1}\n- human approval required: {}\n- can deploy: {}\n\n",
        r.category,
        r.level,
        r.security_risk,
        r.quality_risk,
        r.compliance_risk,
        if assessment.approval_required { "yes" } else { "no" },
        if assessment.can_deploy { "yes" } else { "no" },
    ));
    out.push_str(&format!("{}\n\n", r.justification));

    if !v.issues.is_empty() {
        out.push_str("## Issues\n");
        for severity in [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
            Severity::Info,
        ] {
            for issue in v.issues.iter().filter(|i| i.severity == severity) {
                out.push_str(&format!(
                    "- **{}** `{}` {}: {}\n",
                    issue.severity, issue.kind, issue.location, issue.message
                ));
            }
        }
        out.push('\n');
    }

    let lists = [
        ("Recommendations", &v.recommendations),
        ("Mitigations", &r.mitigation_actions),
        ("Monitoring", &r.monitoring_requirements),
        ("Errors", &assessment.errors),
    ];
    for (title, items) in lists {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("## {title}\n"));
        for item in items.iter() {
            out.push_str(&format!("- {item}\n"));
        }
        out.push('\n');
    }
    out
}

/// Write the markdown summary.
pub fn write_assessment_md(path: &Path, assessment: &CompleteAssessment) -> Result<()> {
    let md = render_assessment_md(assessment);
    std::fs::write(path, md).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Candidate;
    use serde_json::json;

    fn failed() -> CompleteAssessment {
        let candidate = Candidate::in_memory("OrderAgent", "OrderAgent.cs", "class OrderAgent {}");
        CompleteAssessment::failed(&candidate, "timed out", vec!["provider env: unavailable".into()])
    }

    #[test]
    fn report_schema_has_expected_keys() {
        let generated_at = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .expect("parse RFC3339")
            .with_timezone(&Utc);
        let artifact = AssessmentReportArtifact::new(&failed(), generated_at);
        let raw = serde_json::to_value(&artifact).expect("serialize artifact");
        let obj = raw.as_object().expect("artifact object");
        assert!(obj.contains_key("schema_version"));
        assert!(obj.contains_key("generated_at"));
        assert!(obj.contains_key("assessment"));
        assert_eq!(raw["exit_code"], json!(2));
        assert_eq!(raw["assessment"]["risk"]["level"], json!("critical"));
        assert_eq!(raw["assessment"]["can_deploy"], json!(false));
    }

    #[test]
    fn markdown_lists_issues_and_errors() {
        let md = render_assessment_md(&failed());
        assert!(md.starts_with("# Assessment: OrderAgent\n\n"));
        assert!(md.contains("- overall: 0.0\n"));
        assert!(md.contains("- level: critical\n"));
        assert!(md.contains("## Issues\n- **critical** `pipeline` OrderAgent.cs: pipeline error: timed out\n"));
        assert!(md.contains("## Errors\n- provider env: unavailable\n- timed out\n"));
    }

    #[test]
    fn writers_create_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = failed();
        write_assessment_md(&dir.path().join("report.md"), &a).unwrap();
        write_assessment_json(
            &dir.path().join("report.json"),
            &AssessmentReportArtifact::new(&a, Utc::now()),
        )
        .unwrap();
        let back: AssessmentReportArtifact = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("report.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(back.assessment, a);
    }
}
