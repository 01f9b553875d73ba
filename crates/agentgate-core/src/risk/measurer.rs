//! Security, quality and compliance scoring, and the category-conditioned level.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::classifier::PII_PATTERN;
use super::{RiskCategory, RiskLevel, RiskScores};
use crate::source::SourceModel;

/// Security heuristics costing more than `100 - threshold` points escalate
/// any candidate to Critical. Low quality alone never escalates.
pub const DEFAULT_SECURITY_THRESHOLD: f64 = 40.0;

const HARDCODED_SECRET_PENALTY: f64 = 40.0;
const CLOUD_KEY_PENALTY: f64 = 40.0;
const SQL_CONCAT_PENALTY: f64 = 30.0;
const MISSING_VALIDATION_PENALTY: f64 = 10.0;
const MISSING_LOGGING_PENALTY: f64 = 20.0;
const UNPROTECTED_PII_PENALTY: f64 = 15.0;

/// Average-score cut-offs per category. An average below a cut-off lands in
/// the named level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LevelThresholds {
    pub high_category_critical_below: f64,
    pub high_category_high_below: f64,
    pub medium_category_high_below: f64,
    pub medium_category_medium_below: f64,
    pub low_category_medium_below: f64,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            high_category_critical_below: 85.0,
            high_category_high_below: 95.0,
            medium_category_high_below: 70.0,
            medium_category_medium_below: 85.0,
            low_category_medium_below: 60.0,
        }
    }
}

impl LevelThresholds {
    /// Level for `average` within `category`.
    ///
    /// A High category never resolves below Medium.
    pub fn level_for(&self, category: RiskCategory, average: f64) -> RiskLevel {
        match category {
            RiskCategory::High => {
                if average < self.high_category_critical_below {
                    RiskLevel::Critical
                } else if average < self.high_category_high_below {
                    RiskLevel::High
                } else {
                    RiskLevel::Medium
                }
            }
            RiskCategory::Medium => {
                if average < self.medium_category_high_below {
                    RiskLevel::High
                } else if average < self.medium_category_medium_below {
                    RiskLevel::Medium
                } else {
                    RiskLevel::Low
                }
            }
            RiskCategory::Low => {
                if average < self.low_category_medium_below {
                    RiskLevel::Medium
                } else {
                    RiskLevel::Low
                }
            }
        }
    }
}

/// Output of [`RiskMeasurer::measure`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMeasurement {
    pub scores: RiskScores,
    pub average: f64,
    pub level: RiskLevel,
    /// Matched heuristics, in evaluation order.
    pub findings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskMeasurer {
    pub thresholds: LevelThresholds,
    pub security_threshold: f64,
}

impl Default for RiskMeasurer {
    fn default() -> Self {
        Self {
            thresholds: LevelThresholds::default(),
            security_threshold: DEFAULT_SECURITY_THRESHOLD,
        }
    }
}

struct Heuristics {
    secret: Option<Regex>,
    cloud_key: Option<Regex>,
    sql_concat: Vec<Regex>,
    validation: Option<Regex>,
    logging: Option<Regex>,
    pii: Option<Regex>,
    protection: Option<Regex>,
}

fn heuristics() -> &'static Heuristics {
    static H: OnceLock<Heuristics> = OnceLock::new();
    H.get_or_init(|| Heuristics {
        secret: Regex::new(
            r#"(?i)\b(password|passwd|pwd|secret|api_?key|access_?key|client_?secret|auth_?token)\w*["']?\s*[:=]\s*@?["'][^"'\s]{4,}["']"#,
        )
        .ok(),
        cloud_key: Regex::new(r"\bAKIA[0-9A-Z]{16}\b").ok(),
        sql_concat: [
            r#"(?i)"[^"\n]*\b(select|insert|update|delete)\b[^"\n]*"\s*\+"#,
            r#"(?i)\$"[^"\n]*\b(select|insert|update|delete)\b[^"\n]*\{"#,
            r"(?i)`[^`]*\b(select|insert|update|delete)\b[^`]*\$\{",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect(),
        validation: Regex::new(
            r"(?i)(ArgumentNullException|ArgumentException|ThrowIfNull|IsNullOrEmpty|IsNullOrWhiteSpace|requireNonNull|\bvalidat|\bguard\b|[!=]=\s*null\b|\bis null\b|\bassert)",
        )
        .ok(),
        logging: Regex::new(
            r"(?i)(logger|logging|\blog(information|warning|error|debug|info|trace)?\s*\(|\b_?log\.|console\.(log|info|warn|error)\s*\()",
        )
        .ok(),
        pii: Regex::new(PII_PATTERN).ok(),
        protection: Regex::new(r"(?i)(encrypt|mask|redact|\bhash|protect|tokeniz)").ok(),
    })
}

fn matches(re: &Option<Regex>, text: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(text))
}

impl RiskMeasurer {
    pub fn new(thresholds: LevelThresholds, security_threshold: f64) -> Self {
        Self {
            thresholds,
            security_threshold,
        }
    }

    /// Score the candidate. `model` is absent when the source did not parse,
    /// in which case the validation heuristic is skipped.
    pub fn measure(
        &self,
        source: &str,
        model: Option<&SourceModel>,
        overall_quality: f64,
        category: RiskCategory,
    ) -> RiskMeasurement {
        let h = heuristics();
        let quality = overall_quality.clamp(0.0, 100.0);
        let mut findings = Vec::new();

        let mut penalty = 0.0;
        if matches(&h.secret, source) {
            penalty += HARDCODED_SECRET_PENALTY;
            findings.push("hardcoded secret assignment".to_string());
        }
        if matches(&h.cloud_key, source) {
            penalty += CLOUD_KEY_PENALTY;
            findings.push("cloud access key in source".to_string());
        }
        if h.sql_concat.iter().any(|re| re.is_match(source)) {
            penalty += SQL_CONCAT_PENALTY;
            findings.push("SQL built by string concatenation".to_string());
        }
        let exposes_parameters = model.is_some_and(|m| {
            m.all_methods()
                .any(|(_, method)| method.is_public && !method.params.is_empty())
        });
        if exposes_parameters && !matches(&h.validation, source) {
            penalty += MISSING_VALIDATION_PENALTY;
            findings.push("public methods accept input without validation".to_string());
        }
        let security = quality - penalty;

        let mut compliance = quality;
        if !matches(&h.logging, source) {
            compliance -= MISSING_LOGGING_PENALTY;
            findings.push("no logging".to_string());
        }
        if category == RiskCategory::High
            && matches(&h.pii, source)
            && !matches(&h.protection, source)
        {
            compliance -= UNPROTECTED_PII_PENALTY;
            findings.push("personal data without encryption or masking".to_string());
        }

        let scores = RiskScores {
            security: security.max(0.0),
            quality,
            compliance: compliance.max(0.0),
        };
        let average = scores.average();
        let mut level = self.thresholds.level_for(category, average);
        let heuristic_security = 100.0 - penalty;
        if heuristic_security < self.security_threshold {
            level = RiskLevel::Critical;
            findings.push(format!(
                "security heuristics score {heuristic_security:.1} below threshold {:.1}",
                self.security_threshold
            ));
        }

        RiskMeasurement {
            scores,
            average,
            level,
            findings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::parse_source;

    const CLEAN: &str = r#"
public class OrderAgent : BaseAgent
{
    public void Run(string input)
    {
        if (input == null) throw new ArgumentNullException(nameof(input));
        _logger.LogInformation("running");
    }
}
"#;

    fn measure(src: &str, quality: f64, category: RiskCategory) -> RiskMeasurement {
        let model = parse_source("a.cs", src).ok();
        RiskMeasurer::default().measure(src, model.as_ref(), quality, category)
    }

    #[test]
    fn test_clean_source_keeps_quality_baseline() {
        let m = measure(CLEAN, 100.0, RiskCategory::Low);
        assert!(m.findings.is_empty(), "{:?}", m.findings);
        assert_eq!(m.average, 100.0);
        assert_eq!(m.level, RiskLevel::Low);
    }

    #[test]
    fn test_high_category_never_below_medium() {
        let m = measure(CLEAN, 100.0, RiskCategory::High);
        assert_eq!(m.level, RiskLevel::Medium);
    }

    #[test]
    fn test_level_table_shape() {
        let t = LevelThresholds::default();
        assert_eq!(t.level_for(RiskCategory::High, 84.9), RiskLevel::Critical);
        assert_eq!(t.level_for(RiskCategory::High, 85.0), RiskLevel::High);
        assert_eq!(t.level_for(RiskCategory::High, 95.0), RiskLevel::Medium);
        assert_eq!(t.level_for(RiskCategory::Medium, 69.9), RiskLevel::High);
        assert_eq!(t.level_for(RiskCategory::Medium, 70.0), RiskLevel::Medium);
        assert_eq!(t.level_for(RiskCategory::Medium, 85.0), RiskLevel::Low);
        assert_eq!(t.level_for(RiskCategory::Low, 59.9), RiskLevel::Medium);
        assert_eq!(t.level_for(RiskCategory::Low, 60.0), RiskLevel::Low);
    }

    #[test]
    fn test_secret_and_cloud_key_escalate_to_critical() {
        let src = format!(
            "{CLEAN}\nclass Config {{ string ApiKey = \"sk-live-123456\"; string Id = \"AKIA{}\"; }}",
            "ABCDEFGHIJKLMNOP"
        );
        let m = measure(&src, 100.0, RiskCategory::Low);
        assert_eq!(m.scores.security, 20.0);
        assert_eq!(m.level, RiskLevel::Critical);
    }

    #[test]
    fn test_sql_concatenation_penalty() {
        let src = format!(
            "{CLEAN}\nclass Repo {{ string Q(string id) {{ return \"SELECT * FROM t WHERE id=\" + id; }} }}"
        );
        let m = measure(&src, 100.0, RiskCategory::Low);
        assert_eq!(m.scores.security, 70.0);
    }

    #[test]
    fn test_missing_validation_and_logging() {
        let src = "public class A { public void Run(string input) { Process(input); } }";
        let m = measure(src, 100.0, RiskCategory::Low);
        assert_eq!(m.scores.security, 90.0);
        assert_eq!(m.scores.compliance, 80.0);
        assert_eq!(m.findings.len(), 2);
    }

    #[test]
    fn test_unprotected_pii_only_for_high_category() {
        let src = format!("{CLEAN}\nclass P {{ string Ssn; }}");
        let high = measure(&src, 100.0, RiskCategory::High);
        assert_eq!(high.scores.compliance, 85.0);
        let low = measure(&src, 100.0, RiskCategory::Low);
        assert_eq!(low.scores.compliance, 100.0);
    }

    #[test]
    fn test_scores_floor_at_zero() {
        let m = measure("class A {}", 10.0, RiskCategory::Low);
        assert_eq!(m.scores.compliance, 0.0);
        assert_eq!(m.level, RiskLevel::Medium);
    }

    #[test]
    fn test_low_quality_alone_never_escalates() {
        let m = measure(CLEAN, 35.0, RiskCategory::Low);
        assert_eq!(m.scores.security, 35.0);
        assert_eq!(m.level, RiskLevel::Medium);

        let unparsed = RiskMeasurer::default().measure("class {", None, 0.0, RiskCategory::Low);
        assert_eq!(unparsed.level, RiskLevel::Medium);
        let medium = measure(CLEAN, 35.0, RiskCategory::Medium);
        assert_eq!(medium.level, RiskLevel::High);
    }

    #[test]
    fn test_secret_escalates_regardless_of_quality() {
        let src = format!(
            "{CLEAN}\nclass Config {{ string ApiKey = \"sk-live-123456\"; string Id = \"AKIA{}\"; }}",
            "ABCDEFGHIJKLMNOP"
        );
        let m = measure(&src, 100.0, RiskCategory::Low);
        assert_eq!(m.level, RiskLevel::Critical);
        let sql_only = format!(
            "{CLEAN}\nclass Repo {{ string Q(string id) {{ return \"SELECT * FROM t WHERE id=\" + id; }} }}"
        );
        assert_eq!(measure(&sql_only, 100.0, RiskCategory::Low).level, RiskLevel::Low);
    }
}
