//! Structured observability hooks for the assessment lifecycle.
//!
//! This module provides:
//! - Candidate-scoped tracing spans via the `AssessmentSpan` RAII guard
//! - Emission functions for lifecycle events: start, stage completion,
//!   degradation, finish, human decision
//!
//! Events are emitted at `info!` level (`warn!` for degradations). Filter
//! with `RUST_LOG`; pass `--json` to the CLI for JSON lines.

use std::time::Duration;

use tracing::{info, warn};

/// RAII guard that enters a candidate-scoped span for one assessment.
///
/// # Example
///
/// ```ignore
/// let _span = AssessmentSpan::enter("PaymentProcessorAgent", &digest);
/// // every event below carries candidate = "PaymentProcessorAgent"
/// ```
pub struct AssessmentSpan {
    _span: tracing::span::EnteredSpan,
}

impl AssessmentSpan {
    pub fn enter(candidate: &str, source_digest: &str) -> Self {
        let span = tracing::info_span!(
            "agentgate.assess",
            candidate = %candidate,
            digest = %source_digest
        );
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: assessment started.
pub fn emit_assessment_started(candidate: &str, source_bytes: usize) {
    info!(event = "assessment.started", candidate = %candidate, source_bytes = source_bytes);
}

/// Emit event: one pipeline stage finished.
pub fn emit_stage_completed(stage: &str, elapsed: Duration) {
    info!(
        event = "assessment.stage_completed",
        stage = %stage,
        elapsed_ms = elapsed.as_millis() as u64,
    );
}

/// Emit event: a stage failed and the pipeline continued with less information.
pub fn emit_degraded(stage: &str, error: &dyn std::fmt::Display) {
    warn!(event = "assessment.degraded", stage = %stage, error = %error);
}

/// Emit event: assessment finished with its verdict.
pub fn emit_assessment_finished(
    candidate: &str,
    overall_quality: f64,
    level: &str,
    exit_code: i32,
    duration_ms: u64,
) {
    info!(
        event = "assessment.finished",
        candidate = %candidate,
        overall_quality = overall_quality,
        level = %level,
        exit_code = exit_code,
        duration_ms = duration_ms,
    );
}

/// Emit event: a human (or manual) approval decision was recorded.
pub fn emit_decision_recorded(candidate: &str, approved: bool, reviewer: Option<&str>) {
    info!(
        event = "decision.recorded",
        candidate = %candidate,
        approved = approved,
        reviewer = reviewer.unwrap_or("-"),
    );
}
