//! Codebase index.
//!
//! [`CodebaseIndex::build`] walks a codebase root and parses every matching
//! source file on a bounded pool of blocking tasks. The index answers lookups
//! by declaration name, by namespace, by name prefix, and the reverse lookup
//! "which namespaces import this one", which the dependency analyzer uses for
//! cycle detection.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::source::parse_source;

/// Errors produced while building the index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("codebase root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("failed to walk codebase: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("index worker failed: {0}")]
    Join(String),
}

/// Result type for index operations.
pub type IndexResult<T> = std::result::Result<T, IndexError>;

/// What the index keeps about one parsed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Path relative to the codebase root.
    pub path: PathBuf,
    pub namespace: Option<String>,
    pub declarations: Vec<String>,
    pub imports: Vec<String>,
}

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &["bin", "obj", "node_modules", "target", "dist", "build"];

/// Parsed view of a codebase, keyed by relative path.
#[derive(Debug, Clone, Default)]
pub struct CodebaseIndex {
    entries: BTreeMap<PathBuf, IndexEntry>,
    /// Files that could not be read or parsed, with the reason.
    skipped: Vec<(PathBuf, String)>,
}

impl CodebaseIndex {
    /// Walk `root` and index every file whose extension is in `extensions`.
    ///
    /// At most `workers` files are parsed concurrently. Unreadable or
    /// unparsable files are skipped and listed in [`CodebaseIndex::skipped`].
    pub async fn build(root: &Path, extensions: &[String], workers: usize) -> IndexResult<Self> {
        if !root.is_dir() {
            return Err(IndexError::RootNotFound(root.to_path_buf()));
        }

        let files = {
            let root = root.to_path_buf();
            let extensions = extensions.to_vec();
            tokio::task::spawn_blocking(move || collect_files(&root, &extensions))
                .await
                .map_err(|e| IndexError::Join(e.to_string()))??
        };

        let sem = Arc::new(Semaphore::new(workers.max(1)));
        let mut join_set = JoinSet::new();
        for path in files {
            let sem = Arc::clone(&sem);
            let root = root.to_path_buf();
            join_set.spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                tokio::task::spawn_blocking(move || index_file(&root, &path))
                    .await
                    .map_err(|e| IndexError::Join(e.to_string()))
            });
        }

        let mut index = Self::default();
        while let Some(joined) = join_set.join_next().await {
            let outcome = joined.map_err(|e| IndexError::Join(e.to_string()))??;
            match outcome {
                Ok(entry) => {
                    index.entries.insert(entry.path.clone(), entry);
                }
                Err(skip) => {
                    warn!(path = %skip.0.display(), reason = %skip.1, "skipping file during indexing");
                    index.skipped.push(skip);
                }
            }
        }
        index.skipped.sort();

        debug!(
            files = index.entries.len(),
            skipped = index.skipped.len(),
            "codebase index built"
        );
        Ok(index)
    }

    /// Build an index from already-parsed entries.
    pub fn from_entries(entries: impl IntoIterator<Item = IndexEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| (e.path.clone(), e))
                .collect(),
            skipped: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn skipped(&self) -> &[(PathBuf, String)] {
        &self.skipped
    }

    /// Files declaring a type called `name`.
    pub fn by_name(&self, name: &str) -> Vec<&IndexEntry> {
        self.entries
            .values()
            .filter(|e| e.declarations.iter().any(|d| d == name))
            .collect()
    }

    /// Files in namespace `namespace`.
    pub fn by_namespace(&self, namespace: &str) -> Vec<&IndexEntry> {
        self.entries
            .values()
            .filter(|e| e.namespace.as_deref() == Some(namespace))
            .collect()
    }

    /// Declaration names starting with `prefix`, sorted and deduplicated.
    pub fn search_prefix(&self, prefix: &str) -> Vec<&str> {
        let names: BTreeSet<&str> = self
            .entries
            .values()
            .flat_map(|e| e.declarations.iter())
            .filter(|d| d.starts_with(prefix))
            .map(String::as_str)
            .collect();
        names.into_iter().collect()
    }

    /// Files importing `namespace`.
    pub fn importers_of(&self, namespace: &str) -> Vec<&IndexEntry> {
        self.entries
            .values()
            .filter(|e| e.imports.iter().any(|i| i == namespace))
            .collect()
    }

    /// Namespaces that (transitively) import `namespace`, up to `max_depth`
    /// hops, tested for `target`.
    ///
    /// The walk is depth-first over the reverse import graph. Each namespace
    /// remembers the most hops it had left when visited and is only walked
    /// again when reached with more, so cycles terminate and a long first
    /// path never hides a shorter one.
    pub fn reaches_back(&self, namespace: &str, target: &str, max_depth: usize) -> bool {
        let mut best = BTreeMap::new();
        self.reaches_back_from(namespace, target, max_depth, &mut best)
    }

    fn reaches_back_from<'a>(
        &'a self,
        namespace: &'a str,
        target: &str,
        depth_left: usize,
        best: &mut BTreeMap<&'a str, usize>,
    ) -> bool {
        if depth_left == 0 {
            return false;
        }
        if best.get(namespace).is_some_and(|&seen| seen >= depth_left) {
            return false;
        }
        best.insert(namespace, depth_left);
        for importer in self.importers_of(namespace) {
            let Some(ns) = importer.namespace.as_deref() else {
                continue;
            };
            if ns == target {
                return true;
            }
            if self.reaches_back_from(ns, target, depth_left - 1, best) {
                return true;
            }
        }
        false
    }
}

fn collect_files(root: &Path, extensions: &[String]) -> IndexResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = walkdir::WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            e.depth() == 0
                || !(e.file_type().is_dir()
                    && (name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())))
        });
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|e| e.trim_start_matches('.') == ext));
        if matches {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn index_file(root: &Path, path: &Path) -> Result<IndexEntry, (PathBuf, String)> {
    let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    let text = std::fs::read_to_string(path).map_err(|e| (relative.clone(), e.to_string()))?;
    let file_name = relative.display().to_string();
    let model = parse_source(&file_name, &text).map_err(|e| (relative.clone(), e.to_string()))?;
    Ok(IndexEntry {
        path: relative,
        namespace: model.namespace.clone(),
        declarations: model.declared_names(),
        imports: model.imports.iter().map(|i| i.path.clone()).collect(),
    })
}
