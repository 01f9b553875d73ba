//! agentgate core library
//!
//! Code governance and risk gating for machine-generated candidates: parse a
//! source file, score it with four analyzers, learn from past approval
//! decisions, classify and measure deployment risk, and decide whether the
//! candidate deploys, needs a human, or is blocked.

pub mod analyzers;
pub mod audit;
pub mod config;
pub mod context;
pub mod domain;
pub mod index;
pub mod learning;
pub mod obs;
pub mod pipeline;
pub mod reporting;
pub mod risk;
pub mod source;
pub mod telemetry;

pub use domain::{
    AnalyzerCategory, AnalyzerReport, Candidate, CodeIssue, CompleteAssessment, GateError,
    IssueKind, Location, Result, Severity, ValidationResult, EXIT_APPROVED, EXIT_BLOCKED,
    EXIT_CONFIG_ERROR, EXIT_REJECTED,
};

pub use analyzers::analyze_all;
pub use audit::{AuditError, AuditEvent, AuditLog, AuditRecord};
pub use config::{ConfigError, GovernanceConfig, RiskPolicy};
pub use context::{
    CapabilityRule, CatalogFileProvider, ContextGatherer, ContextOverlay, ContextProvider,
    EnvOverridesProvider, NamingConventions, OrganizationalContext, ProviderError,
};
pub use index::{CodebaseIndex, IndexEntry, IndexError};
pub use learning::{
    ApprovalRecord, HistoryStats, LearnedPatterns, LearningConfig, PatternLearningStore,
    StoreError,
};
pub use pipeline::Pipeline;
pub use reporting::{
    render_assessment_md, write_assessment_json, write_assessment_md, AssessmentReportArtifact,
};
pub use risk::{
    ClassifierRules, DecisionEngine, LevelThresholds, RiskAssessment, RiskCategory, RiskLevel,
    RiskMeasurer, RiskScores,
};
pub use source::{parse_source, ParseError, SourceModel};
