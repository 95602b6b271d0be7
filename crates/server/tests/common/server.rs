//! Server test utilities.
//! Note: #[allow(dead_code)] because each test file compiles common/ separately.

#![allow(dead_code)]

use super::fixtures::{multipart_body, multipart_content_type};
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use shelf_core::AppConfig;
use shelf_server::{AppState, create_router};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tower::ServiceExt;

/// A test server wrapper rooted in a temporary file tree.
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

impl TestServer {
    /// Create a test server over an empty temp root.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let files_root = temp_dir.path().join("files");
        fs::create_dir_all(&files_root).expect("Failed to create files root");

        let mut config = AppConfig::for_testing();
        config.files.root = files_root;
        modifier(&mut config);

        let state = AppState::new(config);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// The served root on disk.
    pub fn root(&self) -> PathBuf {
        self.state.config.files.root.clone()
    }

    /// Write a file under the served root, creating parent directories.
    pub fn write_file(&self, rel: &str, contents: &[u8]) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write file");
    }

    /// Create a (possibly empty) directory under the served root.
    pub fn make_dir(&self, rel: &str) {
        fs::create_dir_all(self.root().join(rel)).expect("create dir");
    }

    /// Write a sidecar into `dir` (relative to the root; "" means the root).
    pub fn write_sidecar(&self, dir: &str, yaml: &str) {
        let dir_path = if dir.is_empty() {
            self.root()
        } else {
            self.root().join(dir)
        };
        fs::create_dir_all(&dir_path).expect("create sidecar dir");
        fs::write(dir_path.join(".shelf.yml"), yaml).expect("write sidecar");
    }

    /// Rebuild the search index synchronously.
    pub async fn rebuild_index(&self) {
        self.state.index.rebuild().await.expect("rebuild index");
    }

    /// Issue a request and return the raw response.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        identity: Option<&str>,
        body: Option<(String, Vec<u8>)>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(identity) = identity {
            builder = builder.header("x-remote-user", identity);
        }
        let body = match body {
            Some((content_type, bytes)) => {
                builder = builder.header("Content-Type", content_type);
                Body::from(bytes)
            }
            None => Body::empty(),
        };
        let request = builder.body(body).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// GET a JSON endpoint.
    pub async fn get_json(&self, uri: &str, identity: Option<&str>) -> (StatusCode, Value) {
        let response = self.request("GET", uri, identity, None).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// GET raw bytes plus response headers.
    pub async fn get_bytes(&self, uri: &str) -> (StatusCode, HeaderMap, Bytes) {
        let response = self.request("GET", uri, None, None).await;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, bytes)
    }

    /// POST a multipart upload with one `file` part per entry.
    pub async fn post_files(
        &self,
        uri: &str,
        identity: Option<&str>,
        files: &[(&str, &[u8])],
    ) -> (StatusCode, Value) {
        let response = self
            .request(
                "POST",
                uri,
                identity,
                Some((multipart_content_type(), multipart_body(files))),
            )
            .await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    /// DELETE a path.
    pub async fn delete(&self, uri: &str, identity: Option<&str>) -> (StatusCode, Value) {
        let response = self.request("DELETE", uri, identity, None).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    /// Whether a path exists under the served root.
    pub fn exists(&self, rel: &str) -> bool {
        self.root().join(Path::new(rel)).exists()
    }
}
