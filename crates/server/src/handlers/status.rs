//! Status and single-file info endpoints.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use shelf_storage::paths;
use std::time::SystemTime;
use time::format_description::well_known::Rfc3339;

/// Server status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub root: String,
    /// Process-wide default flags; directories may override via sidecars.
    pub upload: bool,
    pub delete: bool,
    pub index_entries: usize,
    pub index_generation: u64,
    pub index_built_at: Option<String>,
}

/// GET /-/status
pub async fn get_status(State(state): State<AppState>) -> ApiResult<Json<StatusResponse>> {
    let snapshot = state.index.snapshot();
    let index_built_at = match snapshot.built_at {
        Some(ts) => Some(
            ts.format(&Rfc3339)
                .map_err(|e| ApiError::Internal(format!("failed to format build time: {e}")))?,
        ),
        None => None,
    };

    Ok(Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        root: state.config.files.root.display().to_string(),
        upload: state.config.access.upload,
        delete: state.config.access.delete,
        index_entries: snapshot.entries.len(),
        index_generation: snapshot.generation,
        index_built_at,
    }))
}

/// Single-file info response.
#[derive(Debug, Serialize)]
pub struct FileInfoResponse {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub size: u64,
    pub path: String,
    /// Modification time in unix milliseconds.
    pub mtime: i64,
}

/// GET /-/info/{path}
pub async fn file_info(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<Json<FileInfoResponse>> {
    let normalized = paths::normalize(&path)?;
    let fs_path = paths::to_fs_path(&state.config.files.root, &normalized);

    let meta = tokio::fs::metadata(&fs_path).await.map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            ApiError::NotFound(format!("no such file: /{normalized}"))
        } else {
            ApiError::Storage(err.into())
        }
    })?;
    if !meta.is_file() {
        return Err(ApiError::BadRequest(format!("not a file: /{normalized}")));
    }

    let kind = if normalized.ends_with(".md") {
        "markdown"
    } else {
        "text"
    };
    let mtime = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);

    Ok(Json(FileInfoResponse {
        name: paths::base_name(&normalized).to_string(),
        kind,
        size: meta.len(),
        path: normalized,
        mtime,
    }))
}
