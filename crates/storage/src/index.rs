//! Background search index with atomic snapshot publication.

use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use time::OffsetDateTime;
use walkdir::WalkDir;

/// One indexed file.
#[derive(Clone, Debug)]
pub struct IndexEntry {
    /// Slash-normalized path relative to the served root.
    pub relative_path: String,
    /// File size in bytes.
    pub size: u64,
    /// Carried for the listing layer's classification; directories are
    /// descended during the walk but never indexed, so this is false for
    /// every entry a build produces.
    pub is_dir: bool,
    /// Last modification time.
    pub modified: SystemTime,
}

/// One immutable, fully built generation of the index.
#[derive(Debug)]
pub struct IndexSnapshot {
    /// Indexed files in walk order.
    pub entries: Vec<IndexEntry>,
    /// Monotonic build counter (0 = the empty pre-first-build generation).
    pub generation: u64,
    /// When this generation finished building.
    pub built_at: Option<OffsetDateTime>,
}

impl IndexSnapshot {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            generation: 0,
            built_at: None,
        }
    }
}

/// Search index over every file under the served root.
///
/// A background task rebuilds the snapshot on a fixed interval. Publication
/// is a single `Arc` swap behind a short-lived write lock, so readers always
/// observe exactly one complete generation and never block on a build.
pub struct SearchIndex {
    root: PathBuf,
    snapshot: RwLock<Arc<IndexSnapshot>>,
}

impl SearchIndex {
    /// Create an index over `root` with an empty initial snapshot.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            snapshot: RwLock::new(Arc::new(IndexSnapshot::empty())),
        }
    }

    /// Current snapshot (possibly the empty pre-first-build generation).
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.snapshot.read().clone()
    }

    /// Walk the root and publish a fresh snapshot, returning its entry count.
    ///
    /// Unreadable entries are skipped with a warning so one bad subtree
    /// cannot abort the build; only an unopenable root fails the rebuild, in
    /// which case the previous snapshot keeps serving.
    pub async fn rebuild(&self) -> StorageResult<usize> {
        let root = self.root.clone();
        let entries = tokio::task::spawn_blocking(move || walk_entries(&root))
            .await
            .map_err(|e| {
                StorageError::Io(std::io::Error::other(format!("index build task failed: {e}")))
            })??;

        let count = entries.len();
        let mut slot = self.snapshot.write();
        *slot = Arc::new(IndexSnapshot {
            entries,
            generation: slot.generation + 1,
            built_at: Some(OffsetDateTime::now_utc()),
        });
        Ok(count)
    }

    /// Token query against the current snapshot.
    ///
    /// The query splits on whitespace; a `-` prefix negates a token (the
    /// path must NOT contain it), otherwise the path must contain it, both
    /// case-insensitive. Empty tokens are ignored and an entry matches only
    /// if every token succeeds. Results preserve snapshot order; the result
    /// cap and any path-prefix restriction belong to callers.
    pub fn search(&self, query: &str) -> Vec<IndexEntry> {
        let snapshot = self.snapshot();
        snapshot
            .entries
            .iter()
            .filter(|entry| matches_query(&entry.relative_path, query))
            .cloned()
            .collect()
    }

    /// Spawn the periodic rebuild task: one build shortly after startup,
    /// then one per interval, forever.
    pub fn spawn_rebuild_task(
        self: Arc<Self>,
        startup_delay: Duration,
        interval: Duration,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tokio::time::sleep(startup_delay).await;
            loop {
                let started = Instant::now();
                match self.rebuild().await {
                    Ok(count) => {
                        tracing::info!(
                            entries = count,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "search index rebuilt"
                        );
                    }
                    Err(err) => {
                        tracing::error!(
                            error = %err,
                            "search index rebuild failed, serving previous snapshot"
                        );
                    }
                }
                tokio::time::sleep(interval).await;
            }
        })
    }
}

/// Collect every file under `root`. Directories are descended but not
/// collected; a failure on the root itself is the only hard error.
fn walk_entries(root: &Path) -> StorageResult<Vec<IndexEntry>> {
    if !root.is_dir() {
        return Err(StorageError::NotFound(format!(
            "index root is not a directory: {}",
            root.display()
        )));
    }

    let mut entries = Vec::new();
    for item in WalkDir::new(root) {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                if err.path() == Some(root) {
                    return Err(StorageError::Io(std::io::Error::other(err)));
                }
                tracing::warn!(error = %err, "skipping unreadable entry during index walk");
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(err) => {
                tracing::warn!(
                    path = %entry.path().display(),
                    error = %err,
                    "skipping entry with unreadable metadata"
                );
                continue;
            }
        };
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        entries.push(IndexEntry {
            relative_path: relative.to_string_lossy().replace('\\', "/"),
            size: meta.len(),
            is_dir: false,
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        });
    }
    Ok(entries)
}

fn matches_query(path: &str, query: &str) -> bool {
    let haystack = path.to_lowercase();
    for token in query.split_whitespace() {
        let (must_contain, needle) = match token.strip_prefix('-') {
            Some(rest) => (false, rest),
            None => (true, token),
        };
        if needle.is_empty() {
            continue;
        }
        if haystack.contains(&needle.to_lowercase()) != must_contain {
            return false;
        }
    }
    true
}
