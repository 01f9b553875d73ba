//! The assessment orchestrator.
//!
//! [`Pipeline::assess`] runs context gathering, parsing, history lookup, the
//! four analyzers, risk classification, measurement and the decision, in
//! that order, under one wall-clock timeout. It always returns a
//! [`CompleteAssessment`]: stage failures degrade into recorded errors or,
//! when nothing useful is left, into [`CompleteAssessment::failed`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::OnceCell;
use tracing::Instrument;

use crate::analyzers;
use crate::audit::{AuditEvent, AuditLog, AuditRecord};
use crate::config::{ConfigError, GovernanceConfig};
use crate::context::{CatalogFileProvider, ContextGatherer, EnvOverridesProvider, OrganizationalContext};
use crate::domain::{Candidate, CompleteAssessment, GateError, Result, ValidationResult};
use crate::index::CodebaseIndex;
use crate::learning::{ApprovalRecord, LearnedPatterns, PatternLearningStore};
use crate::obs::{
    emit_assessment_finished, emit_assessment_started, emit_decision_recorded, emit_degraded,
    emit_stage_completed, AssessmentSpan,
};
use crate::risk::{ClassifierRules, DecisionEngine, RiskMeasurer};
use crate::source::parse_source;

/// Sequences every stage of one assessment.
pub struct Pipeline {
    config: GovernanceConfig,
    gatherer: ContextGatherer,
    store: Arc<PatternLearningStore>,
    classifier: Arc<ClassifierRules>,
    measurer: RiskMeasurer,
    audit: Option<AuditLog>,
    index: OnceCell<std::result::Result<Arc<CodebaseIndex>, String>>,
    timeout: Duration,
}

impl Pipeline {
    /// Build a pipeline from a validated configuration.
    ///
    /// Context providers are registered when `EnableContextProviders` is set:
    /// the catalog provider (if `CatalogPath` is configured), then
    /// environment overrides.
    pub fn new(config: GovernanceConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let mut gatherer = ContextGatherer::new();
        if config.enable_context_providers {
            if let Some(path) = &config.catalog_path {
                gatherer = gatherer.with_provider(Arc::new(CatalogFileProvider::new(path.clone())));
            }
            gatherer = gatherer.with_provider(Arc::new(EnvOverridesProvider::from_env()));
        }

        let store = Arc::new(PatternLearningStore::open(
            config.approval_history_path.clone(),
            config.learning.clone(),
        ));
        let audit = config.audit_log_path.clone().map(AuditLog::open);
        let timeout = Duration::from_secs(config.timeout_secs);

        Ok(Self {
            measurer: config.measurer(),
            classifier: Arc::new(ClassifierRules::standard()),
            config,
            gatherer,
            store,
            audit,
            index: OnceCell::new(),
            timeout,
        })
    }

    /// Replace the registered context providers.
    pub fn with_gatherer(mut self, gatherer: ContextGatherer) -> Self {
        self.gatherer = gatherer;
        self
    }

    /// Use a prebuilt index instead of walking `CodebasePath`.
    pub fn with_index(mut self, index: CodebaseIndex) -> Self {
        self.index = OnceCell::new_with(Some(Ok(Arc::new(index))));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub fn store(&self) -> &PatternLearningStore {
        &self.store
    }

    pub fn quality_threshold(&self) -> f64 {
        self.config.risk_policy.quality_threshold
    }

    /// Assess one candidate. Never fails; see the module docs.
    pub async fn assess(&self, candidate: &Candidate) -> CompleteAssessment {
        let span = tracing::info_span!(
            "agentgate.assess",
            candidate = %candidate.name,
            digest = %candidate.digest()
        );
        async move {
            let started = Instant::now();
            emit_assessment_started(&candidate.name, candidate.source.len());

            let mut assessment = match tokio::time::timeout(self.timeout, self.run(candidate)).await
            {
                Ok(Ok(assessment)) => assessment,
                Ok(Err(e)) => {
                    emit_degraded("pipeline", &e);
                    CompleteAssessment::failed(candidate, &e.to_string(), Vec::new())
                }
                Err(_) => {
                    let e = GateError::Timeout(self.timeout);
                    emit_degraded("pipeline", &e);
                    CompleteAssessment::failed(candidate, &e.to_string(), Vec::new())
                }
            };

            if let Some(log) = &self.audit {
                let record = AuditRecord::assessed(&assessment, self.officer(), Utc::now());
                if let Err(e) = log.append(&record) {
                    emit_degraded("audit", &e);
                    assessment.errors.push(format!("audit log: {e}"));
                }
            }

            emit_assessment_finished(
                &assessment.candidate,
                assessment.validation.overall_quality,
                &assessment.risk.level.to_string(),
                assessment.exit_code(),
                started.elapsed().as_millis() as u64,
            );
            assessment
        }
        .instrument(span)
        .await
    }

    async fn run(&self, candidate: &Candidate) -> Result<CompleteAssessment> {
        let mut errors = Vec::new();

        let t = Instant::now();
        let (ctx, provider_errors) = self.gatherer.gather(&self.config.organization).await;
        errors.extend(provider_errors);
        emit_stage_completed("context", t.elapsed());

        let t = Instant::now();
        let index = self.codebase_index(&mut errors).await;
        emit_stage_completed("index", t.elapsed());

        let job = AnalysisJob {
            candidate: candidate.clone(),
            ctx,
            store: Arc::clone(&self.store),
            index,
            classifier: Arc::clone(&self.classifier),
            measurer: self.measurer,
            officer: self.config.risk_policy.accountable_officer.clone(),
            quality_threshold: self.quality_threshold(),
        };
        let span = tracing::Span::current();
        tokio::task::spawn_blocking(move || span.in_scope(|| job.run(errors)))
            .await
            .map_err(|e| GateError::Pipeline(format!("analysis task failed: {e}")))
    }

    async fn codebase_index(&self, errors: &mut Vec<String>) -> Option<Arc<CodebaseIndex>> {
        let built = match (self.index.get(), &self.config.codebase_path) {
            (Some(built), _) => built,
            (None, None) => return None,
            (None, Some(root)) => {
                self.index
                    .get_or_init(|| async {
                        CodebaseIndex::build(
                            root,
                            &self.config.source_extensions,
                            self.config.index_workers,
                        )
                        .await
                        .map(Arc::new)
                        .map_err(|e| e.to_string())
                    })
                    .await
            }
        };
        match built {
            Ok(index) => Some(Arc::clone(index)),
            Err(e) => {
                emit_degraded("index", e);
                errors.push(format!("codebase index: {e}"));
                None
            }
        }
    }

    /// Record a human decision on `assessment`.
    ///
    /// The approval record is durable before this returns. A failing audit
    /// append is logged but does not fail the call.
    pub fn record_decision(
        &self,
        assessment: &CompleteAssessment,
        approved: bool,
        reviewer: Option<&str>,
    ) -> Result<ApprovalRecord> {
        let _span = AssessmentSpan::enter(&assessment.candidate, &assessment.source_digest);
        let record = self.store.record(
            &assessment.candidate,
            approved,
            reviewer,
            assessment.validation.issues.clone(),
        )?;
        emit_decision_recorded(&assessment.candidate, approved, reviewer);

        if let Some(log) = &self.audit {
            let entry = AuditRecord::new(
                &assessment.candidate,
                AuditEvent::HumanDecision {
                    approved,
                    reviewer: reviewer.map(str::to_string),
                },
                self.officer(),
                Utc::now(),
            );
            if let Err(e) = log.append(&entry) {
                emit_degraded("audit", &e);
            }
        }
        Ok(record)
    }

    fn officer(&self) -> Option<&str> {
        self.config.risk_policy.accountable_officer.as_deref()
    }
}

/// The synchronous stages, moved onto a blocking thread as one unit.
struct AnalysisJob {
    candidate: Candidate,
    ctx: OrganizationalContext,
    store: Arc<PatternLearningStore>,
    index: Option<Arc<CodebaseIndex>>,
    classifier: Arc<ClassifierRules>,
    measurer: RiskMeasurer,
    officer: Option<String>,
    quality_threshold: f64,
}

impl AnalysisJob {
    fn run(self, mut errors: Vec<String>) -> CompleteAssessment {
        let candidate = &self.candidate;

        let t = Instant::now();
        let learned = match self.store.load() {
            Ok(_) => self.store.learned(),
            Err(e) => {
                emit_degraded("history", &e);
                errors.push(format!("history store: {e}"));
                LearnedPatterns::default()
            }
        };
        emit_stage_completed("history", t.elapsed());

        let t = Instant::now();
        let (validation, model) = match parse_source(&candidate.file_name, &candidate.source) {
            Ok(model) => {
                let validation =
                    analyzers::analyze_all(&model, &self.ctx, &learned, self.index.as_deref());
                (validation, Some(model))
            }
            Err(e) => {
                emit_degraded("parse", &e);
                let validation =
                    ValidationResult::unparsable(&candidate.file_name, &e.to_string(), e.line());
                (validation, None)
            }
        };
        emit_stage_completed("analyze", t.elapsed());

        let t = Instant::now();
        let classification = self.classifier.classify(&candidate.name, &candidate.source);
        let measurement = self.measurer.measure(
            &candidate.source,
            model.as_ref(),
            validation.overall_quality,
            classification.category,
        );
        let mut risk = DecisionEngine.decide(
            measurement.level,
            classification.category,
            measurement.scores,
            &classification.reason,
            self.officer.as_deref(),
        );
        if !measurement.findings.is_empty() {
            risk.justification
                .push_str(&format!(" Findings: {}.", measurement.findings.join("; ")));
        }
        emit_stage_completed("risk", t.elapsed());

        CompleteAssessment::assemble(candidate, validation, risk, self.quality_threshold, errors)
    }
}
