//! Content and name based risk categorization.
//!
//! Rules are evaluated in order and the first match wins. The category is
//! decided before any quality score exists and later stages never revise it.

use regex::Regex;
use tracing::warn;

use super::RiskCategory;

/// PII markers, shared with the compliance heuristics.
pub(crate) const PII_PATTERN: &str =
    r"(?i)\b(ssn|social security|credit ?card|card ?number|personal ?data|date ?of ?birth|passport)";

/// What a rule inspects.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Regex over the source text.
    Content(Regex),
    /// Case-insensitive substring of the candidate name.
    NameContains(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct ClassifierRule {
    pub category: RiskCategory,
    pub reason: String,
    pub matcher: Matcher,
}

impl ClassifierRule {
    /// Content rule; `None` if `pattern` does not compile.
    pub fn content(category: RiskCategory, reason: &str, pattern: &str) -> Option<Self> {
        match Regex::new(pattern) {
            Ok(re) => Some(Self {
                category,
                reason: reason.to_string(),
                matcher: Matcher::Content(re),
            }),
            Err(e) => {
                warn!(pattern, error = %e, "dropping classifier rule with invalid pattern");
                None
            }
        }
    }

    pub fn name(category: RiskCategory, reason: &str, needles: &[&str]) -> Self {
        Self {
            category,
            reason: reason.to_string(),
            matcher: Matcher::NameContains(needles.iter().map(|s| s.to_ascii_lowercase()).collect()),
        }
    }

    fn matches(&self, name: &str, source: &str) -> bool {
        match &self.matcher {
            Matcher::Content(re) => re.is_match(source),
            Matcher::NameContains(needles) => {
                let name = name.to_ascii_lowercase();
                needles.iter().any(|n| name.contains(n.as_str()))
            }
        }
    }
}

/// The classifier's verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: RiskCategory,
    pub reason: String,
}

/// Ordered, first-match-wins rule table.
#[derive(Debug, Clone)]
pub struct ClassifierRules {
    rules: Vec<ClassifierRule>,
}

impl ClassifierRules {
    pub fn new(rules: Vec<ClassifierRule>) -> Self {
        Self { rules }
    }

    /// The standard table: sensitive domains first, then integrations.
    pub fn standard() -> Self {
        let high = RiskCategory::High;
        let medium = RiskCategory::Medium;
        let mut rules: Vec<ClassifierRule> = [
            ClassifierRule::content(
                high,
                "payment or financial keywords",
                r"(?i)\b(payment|transaction|billing|financial|medical)",
            ),
            ClassifierRule::content(high, "personal data markers", PII_PATTERN),
            ClassifierRule::content(
                high,
                "destructive data mutation",
                r"\b(DELETE|UPDATE|INSERT|DROP)\b",
            ),
        ]
        .into_iter()
        .flatten()
        .collect();
        rules.push(ClassifierRule::name(
            high,
            "candidate name indicates a sensitive domain",
            &["Payment", "Financial", "Medical"],
        ));
        rules.extend(
            [
                ClassifierRule::content(
                    medium,
                    "data processing keywords",
                    r"(?i)\b(etl|batch|dataset|data ?frame|bulk ?(load|insert|import)|csv|data ?processing|data ?pipeline)\b",
                ),
                ClassifierRule::content(
                    medium,
                    "external HTTP calls",
                    r"(?i)(\bhttp ?client\b|\bhttps?://|\bfetch\s*\(|\baxios\b|\bweb ?client\b|\brest ?template\b|\bhttp(get|post|put|delete)\b)",
                ),
            ]
            .into_iter()
            .flatten(),
        );
        rules.push(ClassifierRule::name(
            medium,
            "candidate name indicates an integration",
            &["Integration", "Processor"],
        ));
        Self { rules }
    }

    pub fn rules(&self) -> &[ClassifierRule] {
        &self.rules
    }

    pub fn classify(&self, name: &str, source: &str) -> Classification {
        self.rules
            .iter()
            .find(|rule| rule.matches(name, source))
            .map(|rule| Classification {
                category: rule.category,
                reason: rule.reason.clone(),
            })
            .unwrap_or_else(|| Classification {
                category: RiskCategory::Low,
                reason: "no sensitive content or integration signals".to_string(),
            })
    }
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(name: &str, source: &str) -> Classification {
        ClassifierRules::standard().classify(name, source)
    }

    #[test]
    fn test_standard_rules_all_compile() {
        assert_eq!(ClassifierRules::standard().rules().len(), 7);
    }

    #[test]
    fn test_payment_processor_with_delete_is_high() {
        let c = classify(
            "PaymentProcessorAgent",
            r#"var sql = "DELETE FROM orders WHERE id = @id";"#,
        );
        assert_eq!(c.category, RiskCategory::High);
        assert_eq!(c.reason, "destructive data mutation");
    }

    #[test]
    fn test_lowercase_sql_words_do_not_match() {
        let c = classify("Cleaner", "// delete the temp file, then update the cache");
        assert_eq!(c.category, RiskCategory::Low);
    }

    #[test]
    fn test_pii_markers() {
        assert_eq!(
            classify("Profile", "string Ssn;").category,
            RiskCategory::High
        );
        assert_eq!(
            classify("Profile", "// stores the date of birth").category,
            RiskCategory::High
        );
    }

    #[test]
    fn test_name_heuristics() {
        assert_eq!(classify("MedicalAgent", "").category, RiskCategory::High);
        assert_eq!(
            classify("CrmIntegrationAgent", "").category,
            RiskCategory::Medium
        );
        assert_eq!(classify("GreeterAgent", "").category, RiskCategory::Low);
    }

    #[test]
    fn test_http_is_medium() {
        let c = classify("Weather", "var client = new HttpClient();");
        assert_eq!(c.category, RiskCategory::Medium);
        assert_eq!(c.reason, "external HTTP calls");
    }

    #[test]
    fn test_first_match_wins() {
        let rules = ClassifierRules::new(vec![
            ClassifierRule::name(RiskCategory::Medium, "first", &["agent"]),
            ClassifierRule::name(RiskCategory::High, "second", &["agent"]),
        ]);
        assert_eq!(rules.classify("OrderAgent", "").reason, "first");
    }
}
