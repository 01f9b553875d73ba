//! Candidate input and the terminal assessment aggregate.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::validation::ValidationResult;
use crate::risk::{RiskAssessment, RiskLevel};

/// Exit code: candidate approved for deployment.
pub const EXIT_APPROVED: i32 = 0;
/// Exit code: rejected for low quality or denied by a human.
pub const EXIT_REJECTED: i32 = 1;
/// Exit code: blocked because the risk level is critical.
pub const EXIT_BLOCKED: i32 = 2;
/// Exit code: the invocation could not run because configuration is invalid.
pub const EXIT_CONFIG_ERROR: i32 = 3;

/// The source file under assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Candidate identifier, used for risk heuristics and history records.
    pub name: String,
    /// File name used in issue locations.
    pub file_name: String,
    pub source: String,
}

impl Candidate {
    pub fn in_memory(
        name: impl Into<String>,
        file_name: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            source: source.into(),
        }
    }

    /// Read a candidate from disk. The name defaults to the file stem.
    pub fn from_path(path: &Path, name: Option<&str>) -> std::io::Result<Self> {
        let source = std::fs::read_to_string(path)?;
        let file_name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let name = match name {
            Some(n) => n.to_string(),
            None => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| file_name.clone()),
        };
        Ok(Self {
            name,
            file_name,
            source,
        })
    }

    /// SHA-256 hex digest of the source text.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.source.as_bytes()))
    }
}

/// Terminal result of one pipeline invocation.
///
/// Carries no timestamps or random identifiers: identical inputs and history
/// produce an identical value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteAssessment {
    pub candidate: String,
    pub source_digest: String,
    pub validation: ValidationResult,
    pub risk: RiskAssessment,
    pub approval_required: bool,
    /// `risk.can_auto_deploy && overall_quality >= quality threshold`.
    pub can_deploy: bool,
    pub summary: String,
    /// Degradations encountered on the way (provider, store, index failures).
    pub errors: Vec<String>,
}

impl CompleteAssessment {
    pub fn assemble(
        candidate: &Candidate,
        validation: ValidationResult,
        risk: RiskAssessment,
        quality_threshold: f64,
        errors: Vec<String>,
    ) -> Self {
        let can_deploy = risk.can_auto_deploy && validation.overall_quality >= quality_threshold;
        let approval_required = risk.requires_human_approval;
        let summary = summarize(&candidate.name, &validation, &risk, can_deploy);
        Self {
            candidate: candidate.name.clone(),
            source_digest: candidate.digest(),
            validation,
            risk,
            approval_required,
            can_deploy,
            summary,
            errors,
        }
    }

    /// Worst-case assessment used when the pipeline itself fails.
    pub fn failed(candidate: &Candidate, reason: &str, mut errors: Vec<String>) -> Self {
        errors.push(reason.to_string());
        let validation = ValidationResult::failed(&candidate.file_name, reason);
        let risk = RiskAssessment::pipeline_failure(reason);
        let summary = format!(
            "{}: assessment failed ({reason}); deployment blocked",
            candidate.name
        );
        Self {
            candidate: candidate.name.clone(),
            source_digest: candidate.digest(),
            validation,
            risk,
            approval_required: true,
            can_deploy: false,
            summary,
            errors,
        }
    }

    /// Exit code before any human decision.
    pub fn exit_code(&self) -> i32 {
        if self.risk.level == RiskLevel::Critical {
            EXIT_BLOCKED
        } else if self.can_deploy {
            EXIT_APPROVED
        } else {
            EXIT_REJECTED
        }
    }

    /// Exit code once a human has (or has not) answered the approval prompt.
    ///
    /// A human approval never unblocks a critical candidate and never
    /// overrides the quality threshold. An explicit denial always rejects.
    pub fn final_exit_code(&self, human_approved: Option<bool>, quality_threshold: f64) -> i32 {
        if self.risk.level == RiskLevel::Critical {
            return EXIT_BLOCKED;
        }
        if human_approved == Some(false) {
            return EXIT_REJECTED;
        }
        if self.can_deploy {
            return EXIT_APPROVED;
        }
        let quality_ok = self.validation.overall_quality >= quality_threshold;
        match (self.approval_required, human_approved) {
            (true, Some(true)) if quality_ok => EXIT_APPROVED,
            _ => EXIT_REJECTED,
        }
    }
}

fn summarize(
    name: &str,
    validation: &ValidationResult,
    risk: &RiskAssessment,
    can_deploy: bool,
) -> String {
    let verdict = if risk.level == RiskLevel::Critical {
        "blocked"
    } else if can_deploy {
        "approved for automatic deployment"
    } else if risk.requires_human_approval {
        "human approval required"
    } else {
        "rejected: quality below threshold"
    };
    format!(
        "{name}: quality {:.1}/100 with {} issue(s); risk {} (category {}); {verdict}",
        validation.overall_quality,
        validation.issues.len(),
        risk.level,
        risk.category,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::{DecisionEngine, RiskCategory, RiskScores};

    fn risk(level: RiskLevel, category: RiskCategory) -> RiskAssessment {
        let scores = RiskScores {
            security: 100.0,
            quality: 100.0,
            compliance: 100.0,
        };
        DecisionEngine::default().decide(level, category, scores, "test", None)
    }

    fn validation(overall: f64) -> ValidationResult {
        let mut v = ValidationResult::failed("a.cs", "placeholder");
        v.issues.clear();
        v.semantic = overall;
        v.pattern = overall;
        v.dependency = overall;
        v.architecture = overall;
        v.overall_quality = overall;
        v
    }

    fn candidate() -> Candidate {
        Candidate::in_memory("OrderAgent", "OrderAgent.cs", "class OrderAgent {}")
    }

    #[test]
    fn test_quality_boundary_at_threshold() {
        let at = CompleteAssessment::assemble(
            &candidate(),
            validation(70.0),
            risk(RiskLevel::Low, RiskCategory::Low),
            70.0,
            vec![],
        );
        assert!(at.can_deploy);
        assert_eq!(at.exit_code(), EXIT_APPROVED);

        let below = CompleteAssessment::assemble(
            &candidate(),
            validation(69.999),
            risk(RiskLevel::Low, RiskCategory::Low),
            70.0,
            vec![],
        );
        assert!(!below.can_deploy);
        assert_eq!(below.exit_code(), EXIT_REJECTED);
    }

    #[test]
    fn test_critical_is_blocked_even_with_human_approval() {
        let a = CompleteAssessment::assemble(
            &candidate(),
            validation(100.0),
            risk(RiskLevel::Critical, RiskCategory::High),
            70.0,
            vec![],
        );
        assert_eq!(a.exit_code(), EXIT_BLOCKED);
        assert_eq!(a.final_exit_code(Some(true), 70.0), EXIT_BLOCKED);
    }

    #[test]
    fn test_human_decision_maps_exit_code() {
        let a = CompleteAssessment::assemble(
            &candidate(),
            validation(90.0),
            risk(RiskLevel::High, RiskCategory::Medium),
            70.0,
            vec![],
        );
        assert!(a.approval_required);
        assert!(!a.can_deploy);
        assert_eq!(a.final_exit_code(Some(true), 70.0), EXIT_APPROVED);
        assert_eq!(a.final_exit_code(Some(false), 70.0), EXIT_REJECTED);
        assert_eq!(a.final_exit_code(None, 70.0), EXIT_REJECTED);
    }

    #[test]
    fn test_denial_rejects_deployable_candidate() {
        let a = CompleteAssessment::assemble(
            &candidate(),
            validation(95.0),
            risk(RiskLevel::Low, RiskCategory::Low),
            70.0,
            vec![],
        );
        assert_eq!(a.final_exit_code(None, 70.0), EXIT_APPROVED);
        assert_eq!(a.final_exit_code(Some(false), 70.0), EXIT_REJECTED);
    }

    #[test]
    fn test_human_approval_does_not_override_quality() {
        let a = CompleteAssessment::assemble(
            &candidate(),
            validation(50.0),
            risk(RiskLevel::High, RiskCategory::Medium),
            70.0,
            vec![],
        );
        assert_eq!(a.final_exit_code(Some(true), 70.0), EXIT_REJECTED);
    }

    #[test]
    fn test_failed_assessment_blocks() {
        let a = CompleteAssessment::failed(&candidate(), "timed out", vec![]);
        assert!(!a.can_deploy);
        assert_eq!(a.validation.overall_quality, 0.0);
        assert_eq!(a.exit_code(), EXIT_BLOCKED);
        assert_eq!(a.errors, vec!["timed out".to_string()]);
    }

    #[test]
    fn test_digest_is_stable() {
        assert_eq!(candidate().digest(), candidate().digest());
        assert_eq!(candidate().digest().len(), 64);
    }
}
