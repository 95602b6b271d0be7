//! Common test utilities and fixtures.
//! Note: #[allow(dead_code)] because each test file compiles common/ separately.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Create a temp root populated with the given (path, contents) files.
pub fn tree(files: &[(&str, &str)]) -> TempDir {
    let temp = tempfile::tempdir().expect("create temp dir");
    for (rel, contents) in files {
        write_file(temp.path(), rel, contents.as_bytes());
    }
    temp
}

/// Write a file under `root`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(&path, contents).expect("write file");
}

/// Create a (possibly empty) directory under `root`.
pub fn make_dir(root: &Path, rel: &str) {
    fs::create_dir_all(root.join(rel)).expect("create dir");
}

/// Write a sidecar file into `dir` (relative to `root`; "" means the root).
pub fn write_sidecar(root: &Path, dir: &str, yaml: &str) {
    let dir_path = if dir.is_empty() {
        root.to_path_buf()
    } else {
        root.join(dir)
    };
    fs::create_dir_all(&dir_path).expect("create sidecar dir");
    fs::write(dir_path.join(".shelf.yml"), yaml).expect("write sidecar");
}
