//! Append-only audit trail of assessments and human decisions.
//!
//! Each line of the log is one [`AuditRecord`] carrying a SHA-256 digest of
//! its own body, so edits to past lines are detectable with
//! [`AuditRecord::verify_integrity`]. Records older than the retention
//! window are dropped by [`AuditLog::prune`] through an atomic rewrite.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::CompleteAssessment;
use crate::risk::{RiskCategory, RiskLevel};

/// Errors reading or writing the audit log.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("audit log {path} is corrupt at line {line}: {reason}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to replace audit log {path}: {reason}")]
    Persist { path: PathBuf, reason: String },
}

pub type AuditResult<T> = std::result::Result<T, AuditError>;

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    Assessed {
        exit_code: i32,
        overall_quality: f64,
        level: RiskLevel,
        category: RiskCategory,
        source_digest: String,
    },
    HumanDecision {
        approved: bool,
        reviewer: Option<String>,
    },
}

/// One tamper-evident audit line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub candidate: String,
    pub event: AuditEvent,
    pub accountable_officer: Option<String>,
    /// SHA-256 hex of the canonical JSON of every other field.
    pub digest: String,
}

impl AuditRecord {
    pub fn new(
        candidate: &str,
        event: AuditEvent,
        accountable_officer: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut record = Self {
            id: Uuid::new_v4(),
            recorded_at: now,
            candidate: candidate.to_string(),
            event,
            accountable_officer: accountable_officer.map(str::to_string),
            digest: String::new(),
        };
        record.digest = record.compute_digest();
        record
    }

    /// Record of a finished assessment.
    pub fn assessed(
        assessment: &CompleteAssessment,
        accountable_officer: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(
            &assessment.candidate,
            AuditEvent::Assessed {
                exit_code: assessment.exit_code(),
                overall_quality: assessment.validation.overall_quality,
                level: assessment.risk.level,
                category: assessment.risk.category,
                source_digest: assessment.source_digest.clone(),
            },
            accountable_officer,
            now,
        )
    }

    /// Floats are hashed at fixed precision so a digest survives any JSON
    /// reader that rounds the last digit differently.
    fn compute_digest(&self) -> String {
        let event = match &self.event {
            AuditEvent::Assessed {
                exit_code,
                overall_quality,
                level,
                category,
                source_digest,
            } => serde_json::json!({
                "type": "assessed",
                "exit_code": exit_code,
                "overall_quality": format!("{overall_quality:.6}"),
                "level": level,
                "category": category,
                "source_digest": source_digest,
            }),
            other => serde_json::json!(other),
        };
        let body = serde_json::json!({
            "id": self.id,
            "recorded_at": self.recorded_at.to_rfc3339(),
            "candidate": self.candidate,
            "event": event,
            "accountable_officer": self.accountable_officer,
        });
        let bytes = serde_json::to_vec(&body).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }

    pub fn verify_integrity(&self) -> bool {
        self.digest == self.compute_digest()
    }
}

/// JSON-lines audit log.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    writer: Mutex<()>,
}

impl AuditLog {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> AuditError {
        AuditError::Io {
            path: self.path.clone(),
            source,
        }
    }

    pub fn append(&self, record: &AuditRecord) -> AuditResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;
        file.write_all(line.as_bytes()).map_err(|e| self.io_err(e))?;
        file.sync_data().map_err(|e| self.io_err(e))?;
        debug!(path = %self.path.display(), id = %record.id, "audit record appended");
        Ok(())
    }

    /// Every record in file order. A missing log is empty; a torn final
    /// line is skipped.
    pub fn read(&self) -> AuditResult<Vec<AuditRecord>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_err(e)),
        };
        let ends_cleanly = text.is_empty() || text.ends_with('\n');
        let lines: Vec<&str> = text.lines().collect();
        let mut records = Vec::with_capacity(lines.len());
        for (idx, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) if idx + 1 == lines.len() && !ends_cleanly => {
                    warn!(path = %self.path.display(), error = %e, "skipping torn final audit line");
                }
                Err(e) => {
                    return Err(AuditError::Corrupt {
                        path: self.path.clone(),
                        line: idx + 1,
                        reason: e.to_string(),
                    })
                }
            }
        }
        Ok(records)
    }

    /// Drop records older than `retention_years` before `now`.
    ///
    /// Returns how many records were removed. The log is only rewritten when
    /// something is removed.
    pub fn prune(&self, retention_years: u32, now: DateTime<Utc>) -> AuditResult<usize> {
        let Some(cutoff) = now.checked_sub_months(Months::new(retention_years.saturating_mul(12)))
        else {
            return Ok(0);
        };

        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let records = self.read()?;
        let total = records.len();
        let kept: Vec<_> = records
            .into_iter()
            .filter(|r| r.recorded_at >= cutoff)
            .collect();
        let removed = total - kept.len();
        if removed == 0 {
            return Ok(0);
        }

        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent.to_path_buf(),
            None => PathBuf::from("."),
        };
        let tmp = NamedTempFile::new_in(&dir).map_err(|e| self.io_err(e))?;
        {
            let mut out = BufWriter::new(tmp.as_file());
            for record in &kept {
                serde_json::to_writer(&mut out, record)?;
                out.write_all(b"\n").map_err(|e| self.io_err(e))?;
            }
            out.flush().map_err(|e| self.io_err(e))?;
        }
        tmp.as_file().sync_data().map_err(|e| self.io_err(e))?;
        tmp.persist(&self.path).map_err(|e| AuditError::Persist {
            path: self.path.clone(),
            reason: e.error.to_string(),
        })?;

        debug!(path = %self.path.display(), removed, kept = kept.len(), "audit log pruned");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn decision(candidate: &str, at: DateTime<Utc>) -> AuditRecord {
        AuditRecord::new(
            candidate,
            AuditEvent::HumanDecision {
                approved: true,
                reviewer: Some("alice".to_string()),
            },
            Some("Jordan Lee"),
            at,
        )
    }

    #[test]
    fn test_digest_detects_tampering() {
        let mut record = decision("OrderAgent", Utc::now());
        assert!(record.verify_integrity());
        assert_eq!(record.digest.len(), 64);
        record.candidate = "OtherAgent".to_string();
        assert!(!record.verify_integrity());
    }

    fn assessed(candidate: &str, overall_quality: f64) -> AuditRecord {
        AuditRecord::new(
            candidate,
            AuditEvent::Assessed {
                exit_code: 0,
                overall_quality,
                level: RiskLevel::Low,
                category: RiskCategory::Low,
                source_digest: "ab".repeat(32),
            },
            None,
            Utc::now(),
        )
    }

    #[test]
    fn test_fractional_quality_survives_log_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::open(dir.path().join("audit.jsonl"));
        log.append(&assessed("thirds", 100.0 - 8.0 / 3.0)).unwrap();
        log.append(&assessed("sum", 0.1 + 0.2)).unwrap();
        let records = log.read().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(AuditRecord::verify_integrity));
    }

    #[test]
    fn test_digest_ignores_float_rendering() {
        let record = assessed("thirds", 100.0 - 8.0 / 3.0);
        let line = serde_json::to_string(&record).unwrap();
        assert!(line.contains("97.33333333333333"));

        let reformatted = line.replace("97.33333333333333", "97.333333333333329");
        let parsed: AuditRecord = serde_json::from_str(&reformatted).unwrap();
        assert!(parsed.verify_integrity());

        let tampered = line.replace("97.33333333333333", "97.5");
        let parsed: AuditRecord = serde_json::from_str(&tampered).unwrap();
        assert!(!parsed.verify_integrity());
    }

    #[test]
    fn test_append_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::open(dir.path().join("audit/audit.jsonl"));
        assert!(log.read().unwrap().is_empty());

        log.append(&decision("a", Utc::now())).unwrap();
        log.append(&decision("b", Utc::now())).unwrap();
        let records = log.read().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(AuditRecord::verify_integrity));
        assert_eq!(records[1].candidate, "b");
    }

    #[test]
    fn test_prune_drops_expired_records() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::open(dir.path().join("audit.jsonl"));
        let now = Utc.with_ymd_and_hms(2030, 6, 1, 0, 0, 0).unwrap();
        log.append(&decision("old", Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()))
            .unwrap();
        log.append(&decision("recent", Utc.with_ymd_and_hms(2029, 1, 1, 0, 0, 0).unwrap()))
            .unwrap();

        assert_eq!(log.prune(7, now).unwrap(), 1);
        let records = log.read().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].candidate, "recent");
        assert!(records[0].verify_integrity());

        assert_eq!(log.prune(7, now).unwrap(), 0);
    }

    #[test]
    fn test_event_serializes_tagged() {
        let record = decision("a", Utc::now());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["event"]["type"], "human_decision");
        assert_eq!(json["event"]["approved"], true);
    }
}
