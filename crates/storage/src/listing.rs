//! Directory-listing aggregation.
//!
//! Merges live enumeration or search results with the resolved access
//! policy and folds single-child directory chains into one display entry.

use crate::authorizer::PathAuthorizer;
use crate::error::{StorageError, StorageResult};
use crate::index::SearchIndex;
use crate::paths;
use serde::Serialize;
use shelf_core::policy::AccessPolicy;
use shelf_core::{DIRECTORY_SIZE_SENTINEL, MAX_FOLD_HOPS, MAX_SEARCH_RESULTS};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// File-or-directory discriminator for listing entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// One entry of a directory-listing response. Derived per request, never
/// persisted.
#[derive(Clone, Debug, Serialize)]
pub struct ListingEntry {
    /// Display name: the child name, the search match's path relative to the
    /// request path, or the folded chain for single-child directories.
    pub name: String,
    /// Root-relative path of the entry.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Byte size for files; -1 for directories.
    pub size: i64,
    /// Modification time in unix milliseconds.
    pub mtime: i64,
}

/// An entry candidate before policy filtering and classification.
struct Candidate {
    name: String,
    path: String,
    size: u64,
    is_dir: bool,
    modified: SystemTime,
}

/// Produces the directory-listing view for request paths.
pub struct ListingAggregator {
    root: PathBuf,
    index: Arc<SearchIndex>,
}

impl ListingAggregator {
    /// Create an aggregator over `root`, consulting `index` for searches.
    pub fn new(root: impl Into<PathBuf>, index: Arc<SearchIndex>) -> Self {
        Self {
            root: root.into(),
            index,
        }
    }

    /// List `request_path`: via the search index when `search` is non-empty,
    /// else by enumerating the directory's immediate children.
    ///
    /// Entries whose base name fails the policy's filename rules are
    /// dropped. Output order is whatever enumeration or the index naturally
    /// yields; no order is documented.
    pub async fn list(
        &self,
        request_path: &str,
        search: Option<&str>,
        policy: &AccessPolicy,
        authorizer: &PathAuthorizer,
    ) -> StorageResult<Vec<ListingEntry>> {
        let normalized = paths::normalize(request_path)?;
        let candidates = match search {
            Some(query) if !query.trim().is_empty() => {
                self.search_candidates(&normalized, query)
            }
            _ => self.enumerate_candidates(&normalized).await?,
        };

        let mut entries = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !authorizer.can_access(policy, paths::base_name(&candidate.path)) {
                continue;
            }
            entries.push(self.classify(candidate).await);
        }
        Ok(entries)
    }

    /// Search branch: index matches below the request path, capped at
    /// [`MAX_SEARCH_RESULTS`]. Names are made relative to the request path;
    /// paths stay absolute within the index namespace.
    fn search_candidates(&self, normalized: &str, query: &str) -> Vec<Candidate> {
        let mut out = Vec::new();
        for entry in self.index.search(query) {
            if !paths::has_prefix(&entry.relative_path, normalized) {
                continue;
            }
            if out.len() == MAX_SEARCH_RESULTS {
                break;
            }
            out.push(Candidate {
                name: paths::relative_to(&entry.relative_path, normalized).to_string(),
                path: entry.relative_path,
                size: entry.size,
                is_dir: entry.is_dir,
                modified: entry.modified,
            });
        }
        out
    }

    /// Enumerate branch: one level of the directory's children. A directory
    /// that cannot be read at all is a hard error; individual children with
    /// unreadable metadata are skipped.
    async fn enumerate_candidates(&self, normalized: &str) -> StorageResult<Vec<Candidate>> {
        let dir = paths::to_fs_path(&self.root, normalized);
        let mut read_dir = tokio::fs::read_dir(&dir).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(format!("directory not found: /{normalized}"))
            } else {
                StorageError::Io(err)
            }
        })?;

        let mut out = Vec::new();
        while let Some(child) = read_dir.next_entry().await? {
            let name = child.file_name().to_string_lossy().into_owned();
            let meta = match child.metadata().await {
                Ok(meta) => meta,
                Err(err) => {
                    tracing::warn!(
                        path = %child.path().display(),
                        error = %err,
                        "skipping child with unreadable metadata"
                    );
                    continue;
                }
            };
            out.push(Candidate {
                path: paths::join(normalized, &name),
                name,
                size: meta.len(),
                is_dir: meta.is_dir(),
                modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }
        Ok(out)
    }

    /// Classify a candidate, folding single-child directory chains.
    async fn classify(&self, candidate: Candidate) -> ListingEntry {
        let mtime = unix_millis(candidate.modified);
        if !candidate.is_dir {
            return ListingEntry {
                name: candidate.name,
                path: candidate.path,
                kind: EntryKind::File,
                size: candidate.size as i64,
                mtime,
            };
        }

        let parent = paths::parent(&candidate.path).to_string();
        let base = paths::to_fs_path(&self.root, &parent);
        let folded = fold_single_child(&base, paths::base_name(&candidate.path).to_string()).await;
        ListingEntry {
            path: paths::join(&parent, &folded),
            name: folded,
            kind: EntryKind::Dir,
            size: DIRECTORY_SIZE_SENTINEL,
            mtime,
        }
    }
}

/// Collapse a chain of single-child directories into one display name,
/// descending at most [`MAX_FOLD_HOPS`] levels. A read error or a fold point
/// with zero or multiple children stops early.
async fn fold_single_child(base: &Path, mut name: String) -> String {
    for _ in 0..MAX_FOLD_HOPS {
        match single_child(&base.join(&name)).await {
            Some((child, true)) => name = format!("{name}/{child}"),
            _ => break,
        }
    }
    name
}

/// The directory's only child, if it has exactly one; the flag reports
/// whether that child is itself a directory.
async fn single_child(dir: &Path) -> Option<(String, bool)> {
    let mut read_dir = tokio::fs::read_dir(dir).await.ok()?;
    let first = read_dir.next_entry().await.ok().flatten()?;
    match read_dir.next_entry().await {
        Ok(None) => {}
        // A second child or a read error: not a fold point.
        _ => return None,
    }
    let is_dir = first.file_type().await.ok()?.is_dir();
    Some((first.file_name().to_string_lossy().into_owned(), is_dir))
}

fn unix_millis(t: SystemTime) -> i64 {
    match t.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_millis() as i64,
        Err(_) => 0,
    }
}
