//! Governance configuration document.
//!
//! A single JSON or TOML file (chosen by extension) with PascalCase keys.
//! Relative paths inside the document resolve against the document's own
//! directory. Validation failures are [`ConfigError`]s, the only error that
//! aborts an invocation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::context::OrganizationalContext;
use crate::learning::LearningConfig;
use crate::risk::{LevelThresholds, RiskMeasurer, DEFAULT_SECURITY_THRESHOLD};

/// Errors loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Quality gate applied to `overall_quality` when no policy overrides it.
pub const DEFAULT_QUALITY_THRESHOLD: f64 = 70.0;

/// Who answers for deployments and how the gate is tuned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RiskPolicy {
    pub accountable_officer: Option<String>,
    pub audit_retention_years: u32,
    /// Security score below which a candidate is escalated to Critical.
    pub security_threshold: f64,
    /// Minimum `overall_quality` for deployment.
    pub quality_threshold: f64,
    pub level_thresholds: LevelThresholds,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            accountable_officer: None,
            audit_retention_years: 7,
            security_threshold: DEFAULT_SECURITY_THRESHOLD,
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
            level_thresholds: LevelThresholds::default(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GovernanceConfig {
    /// Root indexed for dependency-cycle detection. Cycles are not checked
    /// when absent.
    pub codebase_path: Option<PathBuf>,
    pub approval_history_path: PathBuf,
    pub enable_context_providers: bool,
    pub risk_policy: RiskPolicy,
    pub organization: OrganizationalContext,
    pub learning: LearningConfig,
    /// Organizational catalog read by the catalog provider.
    pub catalog_path: Option<PathBuf>,
    /// Audit trail location. No audit records are written when absent.
    pub audit_log_path: Option<PathBuf>,
    pub timeout_secs: u64,
    pub index_workers: usize,
    pub source_extensions: Vec<String>,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            codebase_path: None,
            approval_history_path: PathBuf::from("approval_history.jsonl"),
            enable_context_providers: true,
            risk_policy: RiskPolicy::default(),
            organization: OrganizationalContext::default(),
            learning: LearningConfig::default(),
            catalog_path: None,
            audit_log_path: None,
            timeout_secs: 60,
            index_workers: 8,
            source_extensions: ["cs", "java", "ts", "js", "kt"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl GovernanceConfig {
    /// Load, resolve relative paths, and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let parsed = if is_toml {
            Self::from_toml(&text)
        } else {
            Self::from_json(&text)
        };
        let mut config = parsed.map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;

        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            config.resolve_paths(base);
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document without validating it.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<string>"),
            message: e.to_string(),
        })
    }

    /// Parse a TOML document without validating it.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<string>"),
            message: e.to_string(),
        })
    }

    /// Make every relative path absolute against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.approval_history_path);
        for p in [
            self.codebase_path.as_mut(),
            self.catalog_path.as_mut(),
            self.audit_log_path.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            resolve(p);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.organization.validate()?;

        let policy = &self.risk_policy;
        for (key, value) in [
            ("RiskPolicy.QualityThreshold", policy.quality_threshold),
            ("RiskPolicy.SecurityThreshold", policy.security_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{key} must be between 0 and 100, got {value}"
                )));
            }
        }
        if policy.audit_retention_years == 0 {
            return Err(ConfigError::Invalid(
                "RiskPolicy.AuditRetentionYears must be at least 1".to_string(),
            ));
        }
        let t = &policy.level_thresholds;
        if t.high_category_critical_below > t.high_category_high_below
            || t.medium_category_high_below > t.medium_category_medium_below
        {
            return Err(ConfigError::Invalid(
                "RiskPolicy.LevelThresholds cut-offs must increase toward lower risk".to_string(),
            ));
        }

        if self.approval_history_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "ApprovalHistoryPath must not be empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "TimeoutSecs must be greater than 0".to_string(),
            ));
        }
        if self.index_workers == 0 {
            return Err(ConfigError::Invalid(
                "IndexWorkers must be greater than 0".to_string(),
            ));
        }
        if self.source_extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "SourceExtensions must list at least one extension".to_string(),
            ));
        }
        if self.learning.top_kinds == 0 || self.learning.min_rejections == 0 {
            return Err(ConfigError::Invalid(
                "Learning.TopKinds and Learning.MinRejections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn measurer(&self) -> RiskMeasurer {
        RiskMeasurer::new(
            self.risk_policy.level_thresholds,
            self.risk_policy.security_threshold,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GovernanceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.risk_policy.quality_threshold, 70.0);
        assert_eq!(config.risk_policy.security_threshold, 40.0);
        assert_eq!(config.index_workers, 8);
    }

    #[test]
    fn test_json_document() {
        let config = GovernanceConfig::from_json(
            r#"{
                "CodebasePath": "src",
                "ApprovalHistoryPath": "history.jsonl",
                "EnableContextProviders": false,
                "RiskPolicy": {
                    "AccountableOfficer": "Jordan Lee",
                    "AuditRetentionYears": 10,
                    "SecurityThreshold": 50,
                    "QualityThreshold": 75
                },
                "Organization": { "MaxComplexity": 6 }
            }"#,
        )
        .unwrap();
        assert!(!config.enable_context_providers);
        assert_eq!(config.risk_policy.accountable_officer.as_deref(), Some("Jordan Lee"));
        assert_eq!(config.risk_policy.quality_threshold, 75.0);
        assert_eq!(config.organization.max_complexity, 6);
        assert_eq!(config.organization.max_method_lines, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_document() {
        let config = GovernanceConfig::from_toml(
            r#"
ApprovalHistoryPath = "history.jsonl"
TimeoutSecs = 5

[RiskPolicy]
QualityThreshold = 80.0

[Learning]
MinRejections = 2
"#,
        )
        .unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.risk_policy.quality_threshold, 80.0);
        assert_eq!(config.learning.min_rejections, 2);
        assert_eq!(config.learning.top_kinds, 10);
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let mut config = GovernanceConfig::default();
        config.risk_policy.quality_threshold = 120.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = GovernanceConfig::default();
        config.organization.max_method_lines = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("MaxMethodLines"));

        let mut config = GovernanceConfig::default();
        config.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agentgate.json");
        std::fs::write(
            &path,
            r#"{"ApprovalHistoryPath": "state/history.jsonl", "AuditLogPath": "/var/log/audit.jsonl"}"#,
        )
        .unwrap();
        let config = GovernanceConfig::load(&path).unwrap();
        assert_eq!(
            config.approval_history_path,
            dir.path().join("state/history.jsonl")
        );
        assert_eq!(
            config.audit_log_path,
            Some(PathBuf::from("/var/log/audit.jsonl"))
        );
    }

    #[test]
    fn test_load_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agentgate.toml");
        std::fs::write(&path, "TimeoutSecs = \"soon\"").unwrap();
        match GovernanceConfig::load(&path) {
            Err(ConfigError::Parse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = GovernanceConfig::load(Path::new("/nonexistent/agentgate.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
