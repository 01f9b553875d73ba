//! Risk classification, measurement and the deployment decision.
//!
//! The three stages run in order: [`ClassifierRules`] fixes a
//! [`RiskCategory`] from content before any score exists, [`RiskMeasurer`]
//! turns quality and content heuristics into [`RiskScores`] and a
//! [`RiskLevel`], and [`DecisionEngine`] maps level and category to a
//! [`RiskAssessment`].

pub mod classifier;
pub mod decision;
pub mod measurer;

use serde::{Deserialize, Serialize};

pub use classifier::{Classification, ClassifierRule, ClassifierRules};
pub use decision::{DecisionEngine, RiskAssessment};
pub use measurer::{LevelThresholds, RiskMeasurement, RiskMeasurer, DEFAULT_SECURITY_THRESHOLD};

/// How sensitive the candidate's domain is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Overall risk of deploying the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    /// Never deployable, not even with human approval.
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Security, quality and compliance sub-scores, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskScores {
    pub security: f64,
    pub quality: f64,
    pub compliance: f64,
}

impl RiskScores {
    pub fn average(&self) -> f64 {
        (self.security + self.quality + self.compliance) / 3.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn test_average() {
        let s = RiskScores {
            security: 60.0,
            quality: 90.0,
            compliance: 90.0,
        };
        assert_eq!(s.average(), 80.0);
    }

    #[test]
    fn test_display_matches_serde() {
        for level in [
            RiskLevel::Low,
            RiskLevel::Medium,
            RiskLevel::High,
            RiskLevel::Critical,
        ] {
            let json = serde_json::to_string(&level).unwrap();
            assert_eq!(json, format!("\"{level}\""));
        }
        assert_eq!(RiskCategory::High.to_string(), "high");
    }
}
