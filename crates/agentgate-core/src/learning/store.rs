//! JSON-lines backed approval history.
//!
//! Layout: one [`ApprovalRecord`] per line. Appends are a single `write_all`
//! followed by `sync_data`, serialized by a writer lock. A partial final line
//! left by a crash is skipped on load and truncated before the next append.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use chrono::Utc;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::error::{StoreError, StoreResult};
use super::signatures;
use super::{
    rejection_counts, ApprovalRecord, HistoryStats, LearnedPatterns, LearningConfig,
};
use crate::context::OrganizationalContext;
use crate::domain::{CodeIssue, IssueKind};
use crate::source::SourceModel;

/// Persistent approval history with an in-memory view.
#[derive(Debug)]
pub struct PatternLearningStore {
    path: PathBuf,
    config: LearningConfig,
    history: RwLock<Vec<ApprovalRecord>>,
    writer: Mutex<()>,
}

impl PatternLearningStore {
    /// Bind a store to `path`. Nothing is read until [`load`](Self::load).
    pub fn open(path: impl Into<PathBuf>, config: LearningConfig) -> Self {
        Self {
            path: path.into(),
            config,
            history: RwLock::new(Vec::new()),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    /// (Re)load the history from disk and return the number of records.
    ///
    /// A missing file is an empty history. On error the in-memory view is
    /// left unchanged.
    pub fn load(&self) -> StoreResult<usize> {
        let records = read_history(&self.path)?;
        let count = records.len();
        *self.history.write().unwrap_or_else(|e| e.into_inner()) = records;
        debug!(path = %self.path.display(), records = count, "approval history loaded");
        Ok(count)
    }

    /// Snapshot of the in-memory history.
    pub fn history(&self) -> Vec<ApprovalRecord> {
        self.history
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Append a decision and persist it before returning.
    pub fn record(
        &self,
        candidate_id: &str,
        approved: bool,
        reviewer: Option<&str>,
        issues: Vec<CodeIssue>,
    ) -> StoreResult<ApprovalRecord> {
        let record = ApprovalRecord {
            candidate_id: candidate_id.to_string(),
            approved,
            timestamp: Utc::now(),
            reviewer: reviewer.map(str::to_string),
            issues,
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        {
            let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
            self.append_line(line.as_bytes()).map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;
        }

        self.history
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(record)
    }

    fn append_line(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)?;
        truncate_torn_tail(&mut file)?;
        file.write_all(bytes)?;
        file.sync_data()
    }

    /// Rewrite the history file from the in-memory view via an atomic rename.
    ///
    /// Returns the number of records written.
    pub fn compact(&self) -> StoreResult<usize> {
        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let records = self.history();

        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent.to_path_buf(),
            None => PathBuf::from("."),
        };
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        fs::create_dir_all(&dir).map_err(io_err)?;

        let tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        {
            let mut out = BufWriter::new(tmp.as_file());
            for record in &records {
                serde_json::to_writer(&mut out, record)?;
                out.write_all(b"\n").map_err(io_err)?;
            }
            out.flush().map_err(io_err)?;
        }
        tmp.as_file().sync_data().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| StoreError::Persist {
            path: self.path.clone(),
            reason: e.error.to_string(),
        })?;

        debug!(path = %self.path.display(), records = records.len(), "approval history compacted");
        Ok(records.len())
    }

    /// Most frequently rejected issue kinds, at most `limit`.
    pub fn frequent_rejections(&self, limit: usize) -> Vec<(IssueKind, usize)> {
        let history = self.history.read().unwrap_or_else(|e| e.into_inner());
        rejection_counts(&history).into_iter().take(limit).collect()
    }

    pub fn stats(&self) -> HistoryStats {
        let history = self.history.read().unwrap_or_else(|e| e.into_inner());
        HistoryStats::from_history(&history)
    }

    /// Patterns learned from the current in-memory history.
    pub fn learned(&self) -> LearnedPatterns {
        let history = self.history.read().unwrap_or_else(|e| e.into_inner());
        LearnedPatterns::from_history(&history, &self.config)
    }

    /// Re-check `model` for signatures of frequently rejected kinds.
    pub fn check_patterns(
        &self,
        model: &SourceModel,
        ctx: &OrganizationalContext,
    ) -> Vec<CodeIssue> {
        signatures::check(model, ctx, &self.learned())
    }
}

fn read_history(path: &Path) -> StoreResult<Vec<ApprovalRecord>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let ends_cleanly = text.is_empty() || text.ends_with('\n');
    let lines: Vec<&str> = text.lines().collect();
    let mut records = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ApprovalRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) if idx + 1 == lines.len() && !ends_cleanly => {
                warn!(
                    path = %path.display(),
                    line = idx + 1,
                    error = %e,
                    "skipping torn final history line"
                );
            }
            Err(e) => {
                return Err(StoreError::Corrupt {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    reason: e.to_string(),
                })
            }
        }
    }
    Ok(records)
}

/// Drop any bytes after the last newline.
fn truncate_torn_tail(file: &mut File) -> std::io::Result<()> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(());
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    if last[0] == b'\n' {
        return Ok(());
    }

    let mut buf = vec![0u8; 4096];
    let mut end = len;
    loop {
        let start = end.saturating_sub(buf.len() as u64);
        let n = (end - start) as usize;
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(&mut buf[..n])?;
        if let Some(i) = buf[..n].iter().rposition(|&b| b == b'\n') {
            return file.set_len(start + i as u64 + 1);
        }
        if start == 0 {
            return file.set_len(0);
        }
        end = start;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::test_support::issue;

    fn store_in(dir: &tempfile::TempDir) -> PatternLearningStore {
        PatternLearningStore::open(dir.path().join("history.jsonl"), LearningConfig::default())
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.load().unwrap(), 0);
        assert!(store.history().is_empty());
    }

    #[test]
    fn test_record_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .record("OrderAgent", false, Some("alice"), vec![issue(IssueKind::MagicLiteral)])
            .unwrap();
        store.record("OrderAgent", true, None, vec![]).unwrap();

        let reopened = store_in(&dir);
        assert_eq!(reopened.load().unwrap(), 2);
        let history = reopened.history();
        assert_eq!(history[0].reviewer.as_deref(), Some("alice"));
        assert!(history[1].approved);
    }

    #[test]
    fn test_load_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.record("a", false, None, vec![]).unwrap();
        assert_eq!(store.load().unwrap(), 1);
        assert_eq!(store.load().unwrap(), 1);
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn test_torn_tail_is_skipped_and_repaired_on_append() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.record("a", false, None, vec![]).unwrap();
        {
            let mut f = OpenOptions::new().append(true).open(store.path()).unwrap();
            f.write_all(b"{\"candidate_id\":\"b\",\"appr").unwrap();
        }

        let reopened = store_in(&dir);
        assert_eq!(reopened.load().unwrap(), 1);

        reopened.record("c", true, None, vec![]).unwrap();
        let again = store_in(&dir);
        assert_eq!(again.load().unwrap(), 2);
        let ids: Vec<_> = again.history().into_iter().map(|r| r.candidate_id).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_corrupt_interior_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.record("a", false, None, vec![]).unwrap();
        {
            let mut f = OpenOptions::new().append(true).open(store.path()).unwrap();
            f.write_all(b"not json\n").unwrap();
        }
        store.record("b", false, None, vec![]).unwrap();

        let reopened = store_in(&dir);
        match reopened.load() {
            Err(StoreError::Corrupt { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected Corrupt, got {other:?}"),
        }
        assert!(reopened.history().is_empty());
    }

    #[test]
    fn test_compact_rewrites_clean_log() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.record("a", false, None, vec![]).unwrap();
        store.record("b", true, None, vec![]).unwrap();
        {
            let mut f = OpenOptions::new().append(true).open(store.path()).unwrap();
            f.write_all(b"\n\n").unwrap();
        }
        assert_eq!(store.compact().unwrap(), 2);
        let text = fs::read_to_string(store.path()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_frequent_rejections_and_stats() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        for i in 0..4 {
            store
                .record(&format!("c{i}"), false, None, vec![issue(IssueKind::Documentation)])
                .unwrap();
        }
        store
            .record("c9", false, None, vec![issue(IssueKind::Complexity)])
            .unwrap();
        assert_eq!(
            store.frequent_rejections(1),
            vec![(IssueKind::Documentation, 4)]
        );
        assert_eq!(store.stats().rejected, 5);
        assert_eq!(store.learned().kinds, vec![(IssueKind::Documentation, 4)]);
    }

    #[test]
    fn test_concurrent_records_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(store_in(&dir));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    store.record(&format!("c{i}"), i % 2 == 0, None, vec![]).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let reopened = store_in(&dir);
        assert_eq!(reopened.load().unwrap(), 8);
    }
}
