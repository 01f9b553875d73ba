//! Organizational context: the thresholds and conventions analyzers check against.
//!
//! One [`OrganizationalContext`] value is assembled per assessment, from the
//! configuration document plus any [`ContextOverlay`]s contributed by
//! [`ContextProvider`]s, and passed by reference to every analyzer.

pub mod gatherer;
pub mod providers;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

pub use gatherer::{ContextGatherer, ContextProvider, ProviderError};
pub use providers::{CatalogFileProvider, EnvOverridesProvider};

/// Naming rules for declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NamingConventions {
    /// Suffix every public class name must end with, e.g. `Agent`.
    pub class_suffix: Option<String>,
    pub pascal_case_types: bool,
    pub pascal_case_methods: bool,
}

impl Default for NamingConventions {
    fn default() -> Self {
        Self {
            class_suffix: None,
            pascal_case_types: true,
            pascal_case_methods: true,
        }
    }
}

/// Declarative architecture rule for classes whose name matches `name_pattern`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CapabilityRule {
    /// Regex matched against the class name.
    pub name_pattern: String,
    /// At least one of these must appear among the class's bases.
    pub required_bases: Vec<String>,
    /// Every one of these marker interfaces must appear among the bases.
    pub required_capabilities: Vec<String>,
    /// Minimum injected collaborators per constructor.
    pub min_constructor_params: usize,
}

impl CapabilityRule {
    /// The built-in rule: agents extend `BaseAgent` and receive collaborators.
    pub fn agent_base() -> Self {
        Self {
            name_pattern: "Agent$".to_string(),
            required_bases: vec!["BaseAgent".to_string()],
            required_capabilities: Vec::new(),
            min_constructor_params: 1,
        }
    }
}

/// Thresholds and conventions for one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OrganizationalContext {
    pub max_complexity: u32,
    pub max_method_lines: u32,
    pub max_class_lines: u32,
    pub require_docs: bool,
    pub naming: NamingConventions,
    /// Namespace prefixes treated as deprecated.
    pub deprecated_namespaces: Vec<String>,
    pub max_imports: usize,
    pub architecture_rules: Vec<CapabilityRule>,
    /// Literal prefixes recognised as configuration keys.
    pub config_key_prefixes: Vec<String>,
    /// Literals never reported as magic (compared case-insensitively).
    pub status_words: Vec<String>,
}

impl Default for OrganizationalContext {
    fn default() -> Self {
        Self {
            max_complexity: 10,
            max_method_lines: 50,
            max_class_lines: 500,
            require_docs: true,
            naming: NamingConventions::default(),
            deprecated_namespaces: Vec::new(),
            max_imports: 20,
            architecture_rules: vec![CapabilityRule::agent_base()],
            config_key_prefixes: vec![
                "ConnectionStrings".to_string(),
                "AppSettings".to_string(),
                "Logging".to_string(),
            ],
            status_words: [
                "success",
                "succeeded",
                "failed",
                "failure",
                "pending",
                "completed",
                "running",
                "cancelled",
                "canceled",
                "active",
                "inactive",
                "approved",
                "rejected",
                "unknown",
                "warning",
                "timeout",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl OrganizationalContext {
    /// Reject thresholds that make scoring meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("MaxComplexity", self.max_complexity),
            ("MaxMethodLines", self.max_method_lines),
            ("MaxClassLines", self.max_class_lines),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{key} must be greater than 0")));
            }
        }
        for rule in &self.architecture_rules {
            if let Err(e) = regex::Regex::new(&rule.name_pattern) {
                return Err(ConfigError::Invalid(format!(
                    "ArchitectureRules NamePattern '{}' is not a valid regex: {e}",
                    rule.name_pattern
                )));
            }
        }
        Ok(())
    }

    pub fn is_status_word(&self, literal: &str) -> bool {
        self.status_words
            .iter()
            .any(|w| w.eq_ignore_ascii_case(literal))
    }
}

/// Partial context contributed by one provider.
///
/// Scalar fields replace the current value when present; list fields are
/// appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContextOverlay {
    pub max_complexity: Option<u32>,
    pub max_method_lines: Option<u32>,
    pub max_class_lines: Option<u32>,
    pub require_docs: Option<bool>,
    pub class_suffix: Option<String>,
    pub max_imports: Option<usize>,
    pub deprecated_namespaces: Vec<String>,
    pub architecture_rules: Vec<CapabilityRule>,
    pub config_key_prefixes: Vec<String>,
    pub status_words: Vec<String>,
}

impl ContextOverlay {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Context with this overlay applied on top of `base`.
    pub fn apply(&self, base: &OrganizationalContext) -> OrganizationalContext {
        let mut ctx = base.clone();
        if let Some(v) = self.max_complexity {
            ctx.max_complexity = v;
        }
        if let Some(v) = self.max_method_lines {
            ctx.max_method_lines = v;
        }
        if let Some(v) = self.max_class_lines {
            ctx.max_class_lines = v;
        }
        if let Some(v) = self.require_docs {
            ctx.require_docs = v;
        }
        if let Some(v) = &self.class_suffix {
            ctx.naming.class_suffix = Some(v.clone());
        }
        if let Some(v) = self.max_imports {
            ctx.max_imports = v;
        }
        ctx.deprecated_namespaces
            .extend(self.deprecated_namespaces.iter().cloned());
        ctx.architecture_rules
            .extend(self.architecture_rules.iter().cloned());
        ctx.config_key_prefixes
            .extend(self.config_key_prefixes.iter().cloned());
        ctx.status_words.extend(self.status_words.iter().cloned());
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context_is_valid() {
        assert!(OrganizationalContext::default().validate().is_ok());
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let ctx = OrganizationalContext {
            max_complexity: 0,
            ..Default::default()
        };
        let err = ctx.validate().unwrap_err();
        assert!(err.to_string().contains("MaxComplexity"));
    }

    #[test]
    fn test_invalid_rule_regex_rejected() {
        let mut ctx = OrganizationalContext::default();
        ctx.architecture_rules.push(CapabilityRule {
            name_pattern: "(".to_string(),
            ..Default::default()
        });
        assert!(ctx.validate().is_err());
    }

    #[test]
    fn test_overlay_replaces_scalars_and_appends_lists() {
        let overlay = ContextOverlay {
            max_complexity: Some(6),
            class_suffix: Some("Agent".to_string()),
            deprecated_namespaces: vec!["Legacy.Core".to_string()],
            ..Default::default()
        };
        let ctx = overlay.apply(&OrganizationalContext::default());
        assert_eq!(ctx.max_complexity, 6);
        assert_eq!(ctx.max_method_lines, 50);
        assert_eq!(ctx.naming.class_suffix.as_deref(), Some("Agent"));
        assert_eq!(ctx.deprecated_namespaces, vec!["Legacy.Core".to_string()]);
    }

    #[test]
    fn test_pascal_case_document() {
        let ctx: OrganizationalContext = serde_json::from_str(
            r#"{"MaxComplexity": 6, "Naming": {"ClassSuffix": "Agent"}, "RequireDocs": false}"#,
        )
        .unwrap();
        assert_eq!(ctx.max_complexity, 6);
        assert!(!ctx.require_docs);
        assert!(ctx.naming.pascal_case_types);
        assert_eq!(ctx.max_class_lines, 500);
    }

    #[test]
    fn test_status_words_case_insensitive() {
        let ctx = OrganizationalContext::default();
        assert!(ctx.is_status_word("Completed"));
        assert!(!ctx.is_status_word("Completed order"));
    }
}
