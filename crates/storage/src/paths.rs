//! Request-path normalization and containment.
//!
//! Every request path is reduced to a slash-separated path relative to the
//! served root before it touches the filesystem, so a request can never
//! escape the root.

use crate::error::{StorageError, StorageResult};
use std::path::{Component, Path, PathBuf};

/// Normalize a request path.
///
/// `""`, `"."`, and `"/"` all mean the root. Absolute paths, `..`, and any
/// other non-normal component are rejected.
pub fn normalize(request_path: &str) -> StorageResult<String> {
    let trimmed = request_path.trim_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        return Ok(String::new());
    }

    let mut parts = Vec::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => match part.to_str() {
                Some(part) => parts.push(part),
                None => {
                    return Err(StorageError::InvalidPath(format!(
                        "non-unicode path component: {request_path}"
                    )));
                }
            },
            Component::CurDir => {}
            _ => {
                return Err(StorageError::InvalidPath(format!(
                    "unsafe path component: {request_path}"
                )));
            }
        }
    }
    Ok(parts.join("/"))
}

/// Parent of a normalized path (`""` for top-level entries and the root).
pub fn parent(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => "",
    }
}

/// Base name of a normalized path (the path itself for top-level entries).
pub fn base_name(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((_, name)) => name,
        None => path,
    }
}

/// Join two normalized fragments.
pub fn join(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

/// Absolute filesystem location of a normalized request path.
pub fn to_fs_path(root: &Path, normalized: &str) -> PathBuf {
    if normalized.is_empty() {
        root.to_path_buf()
    } else {
        root.join(normalized)
    }
}

/// Whether `path` equals `prefix` or sits below it, component-wise.
/// An empty prefix matches everything.
pub fn has_prefix(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Strip `prefix` (and its separator) from `path`.
/// Returns the path unchanged for an empty prefix.
pub fn relative_to<'a>(path: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return path;
    }
    path.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_aliases_normalize_to_empty() {
        for alias in ["", ".", "/", "//"] {
            assert_eq!(normalize(alias).unwrap(), "");
        }
    }

    #[test]
    fn plain_paths_pass_through() {
        assert_eq!(normalize("a/b/c.txt").unwrap(), "a/b/c.txt");
        assert_eq!(normalize("/a/b/").unwrap(), "a/b");
        assert_eq!(normalize("a/./b").unwrap(), "a/b");
    }

    #[test]
    fn traversal_is_rejected() {
        assert!(normalize("../etc/passwd").is_err());
        assert!(normalize("a/../../b").is_err());
    }

    #[test]
    fn parent_and_base_name() {
        assert_eq!(parent("a/b/c"), "a/b");
        assert_eq!(parent("a"), "");
        assert_eq!(base_name("a/b/c"), "c");
        assert_eq!(base_name("a"), "a");
    }

    #[test]
    fn prefix_matching_is_component_wise() {
        assert!(has_prefix("docs/readme.md", "docs"));
        assert!(has_prefix("docs", "docs"));
        assert!(has_prefix("docs/readme.md", ""));
        // "docs2" is not below "docs".
        assert!(!has_prefix("docs2/readme.md", "docs"));
    }

    #[test]
    fn relative_to_strips_the_prefix() {
        assert_eq!(relative_to("docs/guide/intro.md", "docs"), "guide/intro.md");
        assert_eq!(relative_to("docs/guide/intro.md", ""), "docs/guide/intro.md");
    }
}
