//! Deployment decision: a pure lookup over (level, category).

use serde::{Deserialize, Serialize};

use super::{RiskCategory, RiskLevel, RiskScores};

/// Risk verdict and the deployment response for one candidate.
///
/// # Invariants
///
/// A `Critical` level always has `requires_human_approval = true` and
/// `can_auto_deploy = false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub category: RiskCategory,
    pub level: RiskLevel,
    pub security_risk: f64,
    pub quality_risk: f64,
    pub compliance_risk: f64,
    pub requires_human_approval: bool,
    pub can_auto_deploy: bool,
    pub mitigation_actions: Vec<String>,
    pub monitoring_requirements: Vec<String>,
    pub justification: String,
}

impl RiskAssessment {
    /// Worst-case verdict for a run whose pipeline failed.
    pub fn pipeline_failure(reason: &str) -> Self {
        let mut risk = DecisionEngine.decide(
            RiskLevel::Critical,
            RiskCategory::High,
            RiskScores {
                security: 0.0,
                quality: 0.0,
                compliance: 0.0,
            },
            "assessment pipeline failed",
            None,
        );
        risk.justification = format!("Assessment pipeline failed: {reason}. Deployment is blocked.");
        risk
    }
}

/// Maps `(RiskLevel, RiskCategory)` to a deployment response. Holds no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionEngine;

impl DecisionEngine {
    pub fn decide(
        &self,
        level: RiskLevel,
        category: RiskCategory,
        scores: RiskScores,
        reason: &str,
        accountable_officer: Option<&str>,
    ) -> RiskAssessment {
        let (requires_human_approval, can_auto_deploy) = match level {
            RiskLevel::Critical | RiskLevel::High => (true, false),
            RiskLevel::Medium => {
                let human = category == RiskCategory::High;
                (human, !human)
            }
            RiskLevel::Low => (false, true),
        };

        let mut justification = format!(
            "Category {category} ({reason}); average risk score {:.1} resolves to {level} risk.",
            scores.average()
        );
        if level == RiskLevel::Critical {
            justification.push_str(" Deployment is blocked.");
        } else if requires_human_approval {
            match accountable_officer {
                Some(officer) => {
                    justification.push_str(&format!(" Approval required from {officer}."))
                }
                None => justification.push_str(" Human approval required."),
            }
        } else {
            justification.push_str(" Eligible for automatic deployment.");
        }

        RiskAssessment {
            category,
            level,
            security_risk: scores.security,
            quality_risk: scores.quality,
            compliance_risk: scores.compliance,
            requires_human_approval,
            can_auto_deploy,
            mitigation_actions: mitigations(level, category),
            monitoring_requirements: monitoring(level, category),
            justification,
        }
    }
}

fn mitigations(level: RiskLevel, category: RiskCategory) -> Vec<String> {
    let mut actions: Vec<&str> = match level {
        RiskLevel::Critical => vec![
            "Block deployment until all critical findings are resolved",
            "Escalate to the accountable officer",
            "Perform a manual security review",
        ],
        RiskLevel::High => vec![
            "Require human review before deployment",
            "Add tests covering the flagged code paths",
        ],
        RiskLevel::Medium => vec!["Review flagged issues before the next release"],
        RiskLevel::Low => Vec::new(),
    };
    match category {
        RiskCategory::High => {
            actions.push("Verify handling of financial, medical and personal data");
            actions.push("Confirm database mutations are authorized and reversible");
        }
        RiskCategory::Medium => actions.push("Verify failure handling for external integrations"),
        RiskCategory::Low => {}
    }
    actions.into_iter().map(str::to_string).collect()
}

fn monitoring(level: RiskLevel, category: RiskCategory) -> Vec<String> {
    let mut reqs: Vec<&str> = match level {
        RiskLevel::Critical => vec!["Track remediation of blocking findings"],
        RiskLevel::High => vec![
            "Enable detailed audit logging after deployment",
            "Alert on error-rate increases",
        ],
        RiskLevel::Medium => vec!["Monitor error rates after deployment"],
        RiskLevel::Low => vec!["Standard monitoring"],
    };
    if category == RiskCategory::High {
        reqs.push("Audit every access to sensitive data");
    }
    reqs.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(avg: f64) -> RiskScores {
        RiskScores {
            security: avg,
            quality: avg,
            compliance: avg,
        }
    }

    const LEVELS: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];
    const CATEGORIES: [RiskCategory; 3] =
        [RiskCategory::Low, RiskCategory::Medium, RiskCategory::High];

    #[test]
    fn test_critical_never_auto_deploys() {
        for category in CATEGORIES {
            let r = DecisionEngine.decide(RiskLevel::Critical, category, scores(100.0), "x", None);
            assert!(r.requires_human_approval);
            assert!(!r.can_auto_deploy);
        }
    }

    #[test]
    fn test_decision_table() {
        for level in LEVELS {
            for category in CATEGORIES {
                let r = DecisionEngine.decide(level, category, scores(90.0), "x", None);
                let expected_human = match level {
                    RiskLevel::Critical | RiskLevel::High => true,
                    RiskLevel::Medium => category == RiskCategory::High,
                    RiskLevel::Low => false,
                };
                assert_eq!(r.requires_human_approval, expected_human, "{level}/{category}");
                assert_eq!(r.can_auto_deploy, !expected_human, "{level}/{category}");
            }
        }
    }

    #[test]
    fn test_justification_names_officer() {
        let r = DecisionEngine.decide(
            RiskLevel::Medium,
            RiskCategory::High,
            scores(100.0),
            "destructive data mutation",
            Some("Jordan Lee"),
        );
        assert!(r.justification.contains("destructive data mutation"));
        assert!(r.justification.contains("100.0"));
        assert!(r.justification.contains("Jordan Lee"));
    }

    #[test]
    fn test_pipeline_failure_is_blocking() {
        let r = RiskAssessment::pipeline_failure("timed out after 30s");
        assert_eq!(r.level, RiskLevel::Critical);
        assert!(!r.can_auto_deploy);
        assert!(r.justification.contains("timed out"));
    }

    #[test]
    fn test_low_risk_has_no_mitigations() {
        let r = DecisionEngine.decide(RiskLevel::Low, RiskCategory::Low, scores(100.0), "x", None);
        assert!(r.mitigation_actions.is_empty());
        assert_eq!(r.monitoring_requirements, vec!["Standard monitoring".to_string()]);
    }
}
