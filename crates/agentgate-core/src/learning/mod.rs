//! Pattern learning from past approval decisions.
//!
//! The [`PatternLearningStore`] keeps an append-only JSON-lines history of
//! [`ApprovalRecord`]s. Issue kinds that keep showing up in rejected
//! candidates become [`LearnedPatterns`], and new candidates are re-checked
//! against tightened signatures for those kinds.

pub mod error;
pub mod signatures;
pub mod store;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CodeIssue, IssueKind};

pub use error::{StoreError, StoreResult};
pub use store::PatternLearningStore;

/// One human (or manual) decision about a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub candidate_id: String,
    pub approved: bool,
    pub timestamp: DateTime<Utc>,
    pub reviewer: Option<String>,
    /// Findings at the time of the decision.
    pub issues: Vec<CodeIssue>,
}

impl ApprovalRecord {
    /// Distinct learnable kinds among this record's issues.
    pub fn learnable_kinds(&self) -> BTreeSet<IssueKind> {
        self.issues
            .iter()
            .map(|i| i.kind)
            .filter(|k| k.is_learnable())
            .collect()
    }
}

/// Tuning for how history turns into patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LearningConfig {
    /// How many of the most frequently rejected kinds are re-checked.
    pub top_kinds: usize,
    /// Kinds rejected fewer times than this are ignored.
    pub min_rejections: usize,
    /// Rejection count at which pattern matches are reported as High.
    pub high_severity_rejections: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            top_kinds: 10,
            min_rejections: 3,
            high_severity_rejections: 10,
        }
    }
}

/// Summary counts over the whole history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total: usize,
    pub approved: usize,
    pub rejected: usize,
    pub distinct_candidates: usize,
}

impl HistoryStats {
    pub fn from_history(records: &[ApprovalRecord]) -> Self {
        let approved = records.iter().filter(|r| r.approved).count();
        let distinct: BTreeSet<&str> = records.iter().map(|r| r.candidate_id.as_str()).collect();
        Self {
            total: records.len(),
            approved,
            rejected: records.len() - approved,
            distinct_candidates: distinct.len(),
        }
    }
}

/// `(kind, rejected-record count)` sorted by count descending, then kind.
///
/// Each rejected record counts a kind at most once.
pub fn rejection_counts(records: &[ApprovalRecord]) -> Vec<(IssueKind, usize)> {
    let mut counts: BTreeMap<IssueKind, usize> = BTreeMap::new();
    for record in records.iter().filter(|r| !r.approved) {
        for kind in record.learnable_kinds() {
            *counts.entry(kind).or_default() += 1;
        }
    }
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    counts
}

/// Issue kinds worth re-checking, with how often each was rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearnedPatterns {
    pub kinds: Vec<(IssueKind, usize)>,
    pub high_severity_rejections: usize,
}

impl LearnedPatterns {
    pub fn from_history(records: &[ApprovalRecord], config: &LearningConfig) -> Self {
        let kinds = rejection_counts(records)
            .into_iter()
            .filter(|(_, count)| *count >= config.min_rejections)
            .take(config.top_kinds)
            .collect();
        Self {
            kinds,
            high_severity_rejections: config.high_severity_rejections,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::domain::{AnalyzerCategory, Location, Severity};

    pub fn issue(kind: IssueKind) -> CodeIssue {
        CodeIssue::new(
            AnalyzerCategory::Semantic,
            kind,
            Severity::Low,
            "test finding",
            Location::file("Old.cs"),
        )
    }

    pub fn record(id: &str, approved: bool, kinds: &[IssueKind]) -> ApprovalRecord {
        ApprovalRecord {
            candidate_id: id.to_string(),
            approved,
            timestamp: Utc::now(),
            reviewer: None,
            issues: kinds.iter().map(|k| issue(*k)).collect(),
        }
    }
}
