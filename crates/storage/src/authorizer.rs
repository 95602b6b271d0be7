//! Hierarchical access-policy resolution.

use crate::error::StorageResult;
use crate::paths;
use shelf_core::SIDECAR_FILE_NAME;
use shelf_core::policy::{AccessPolicy, PatternCache, SidecarConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resolves the effective access policy for request paths by overlaying
/// per-directory sidecar files from the served root down.
///
/// Sidecar reads are deliberately uncached: concurrent requests may observe
/// different policies right after an on-disk edit, trading consistency for
/// freshness without any locking around resolution.
pub struct PathAuthorizer {
    root: PathBuf,
    default_upload: bool,
    default_delete: bool,
    patterns: Arc<PatternCache>,
}

impl PathAuthorizer {
    /// Create an authorizer over `root`, seeded with the process-wide
    /// default flags. The pattern cache is injected so embedders and tests
    /// control its lifetime.
    pub fn new(
        root: impl Into<PathBuf>,
        default_upload: bool,
        default_delete: bool,
        patterns: Arc<PatternCache>,
    ) -> Self {
        Self {
            root: root.into(),
            default_upload,
            default_delete,
            patterns,
        }
    }

    /// The served root this authorizer resolves against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The shared pattern cache.
    pub fn patterns(&self) -> &Arc<PatternCache> {
        &self.patterns
    }

    /// Resolve the effective policy for `request_path`.
    ///
    /// If the path names a file, the policy of its containing directory
    /// applies. Paths that do not exist resolve like directories, so their
    /// ancestor chain still contributes. A missing or malformed sidecar
    /// contributes nothing at its level and never fails the request.
    pub async fn resolve(&self, request_path: &str) -> StorageResult<AccessPolicy> {
        let normalized = paths::normalize(request_path)?;
        let owning = self.owning_directory(&normalized).await;

        let mut policy = AccessPolicy::seeded(self.default_upload, self.default_delete);
        self.overlay_level(&mut policy, &self.root).await;

        if !owning.is_empty() {
            let mut dir = self.root.clone();
            for part in owning.split('/') {
                dir.push(part);
                self.overlay_level(&mut policy, &dir).await;
            }
        }
        Ok(policy)
    }

    /// Evaluate the policy's filename rules through the shared cache.
    pub fn can_access(&self, policy: &AccessPolicy, file_name: &str) -> bool {
        policy.can_access(&self.patterns, file_name)
    }

    /// The directory whose sidecar chain owns `normalized`: the path itself
    /// for directories (and anything that does not exist), its parent for
    /// files.
    async fn owning_directory(&self, normalized: &str) -> String {
        if normalized.is_empty() {
            return String::new();
        }
        let fs_path = paths::to_fs_path(&self.root, normalized);
        match tokio::fs::metadata(&fs_path).await {
            Ok(meta) if meta.is_file() => paths::parent(normalized).to_string(),
            _ => normalized.to_string(),
        }
    }

    /// Overlay the sidecar in `dir`, if present and well-formed.
    async fn overlay_level(&self, policy: &mut AccessPolicy, dir: &Path) {
        let sidecar_path = dir.join(SIDECAR_FILE_NAME);
        let text = match tokio::fs::read_to_string(&sidecar_path).await {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return,
            Err(err) => {
                tracing::warn!(
                    path = %sidecar_path.display(),
                    error = %err,
                    "failed to read sidecar, level ignored"
                );
                return;
            }
        };
        match SidecarConfig::from_yaml(&text) {
            Ok(sidecar) => policy.overlay(sidecar),
            Err(err) => {
                tracing::warn!(
                    path = %sidecar_path.display(),
                    error = %err,
                    "malformed sidecar, level ignored"
                );
            }
        }
    }
}
