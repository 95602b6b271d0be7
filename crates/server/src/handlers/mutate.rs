//! Upload and delete endpoints.

use crate::auth::CallerIdentity;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Extension, Multipart, Path, State};
use serde::Serialize;
use shelf_storage::paths;
use tokio::io::AsyncWriteExt;

/// Upload response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    /// Destination file names, in upload order.
    pub files: Vec<String>,
}

/// Delete response.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// POST /{path} — multipart upload into the directory at `path`.
pub async fn upload(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Extension(caller): Extension<CallerIdentity>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    upload_into(state, path, caller, multipart).await
}

/// POST / — multipart upload into the served root.
pub async fn upload_root(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    upload_into(state, String::new(), caller, multipart).await
}

/// Shared upload path. Each `file` part streams to its own destination; the
/// handle is dropped at the end of the iteration, so requests with many
/// parts never accumulate open files.
async fn upload_into(
    state: AppState,
    path: String,
    caller: CallerIdentity,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let policy = state.authorizer.resolve(&path).await?;
    if !policy.can_upload(caller.0.as_ref()) {
        return Err(ApiError::Forbidden("upload not permitted here".to_string()));
    }

    let normalized = paths::normalize(&path)?;
    let dir = paths::to_fs_path(&state.config.files.root, &normalized);
    let dir_meta = tokio::fs::metadata(&dir).await.map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            ApiError::NotFound(format!("upload directory not found: /{normalized}"))
        } else {
            ApiError::Storage(err.into())
        }
    })?;
    if !dir_meta.is_dir() {
        return Err(ApiError::BadRequest(format!(
            "upload target is not a directory: /{normalized}"
        )));
    }

    let mut saved = Vec::new();
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .and_then(sanitize_file_name)
            .ok_or_else(|| ApiError::BadRequest("file part missing a usable file name".to_string()))?;

        let dest = dir.join(&file_name);
        let mut file = tokio::fs::File::create(&dest)
            .await
            .map_err(|err| ApiError::Storage(err.into()))?;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| ApiError::BadRequest(format!("upload stream failed: {e}")))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|err| ApiError::Storage(err.into()))?;
        }
        file.flush()
            .await
            .map_err(|err| ApiError::Storage(err.into()))?;

        tracing::info!(path = %normalized, file = %file_name, "file uploaded");
        saved.push(file_name);
    }

    if saved.is_empty() {
        return Err(ApiError::BadRequest(
            "need at least one multipart 'file' part".to_string(),
        ));
    }

    Ok(Json(UploadResponse {
        success: true,
        files: saved,
    }))
}

/// DELETE /{path} — remove a file or empty directory.
pub async fn delete_path(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Extension(caller): Extension<CallerIdentity>,
) -> ApiResult<Json<DeleteResponse>> {
    let policy = state.authorizer.resolve(&path).await?;
    if !policy.can_delete(caller.0.as_ref()) {
        return Err(ApiError::Forbidden("delete not permitted here".to_string()));
    }

    let normalized = paths::normalize(&path)?;
    if normalized.is_empty() {
        return Err(ApiError::BadRequest(
            "refusing to delete the served root".to_string(),
        ));
    }

    let fs_path = paths::to_fs_path(&state.config.files.root, &normalized);
    let meta = tokio::fs::metadata(&fs_path).await.map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            ApiError::NotFound(format!("no such file or directory: /{normalized}"))
        } else {
            ApiError::Storage(err.into())
        }
    })?;

    let result = if meta.is_dir() {
        tokio::fs::remove_dir(&fs_path).await
    } else {
        tokio::fs::remove_file(&fs_path).await
    };
    result.map_err(|err| ApiError::Storage(err.into()))?;

    tracing::info!(path = %normalized, "path deleted");
    Ok(Json(DeleteResponse { success: true }))
}

/// Reduce a client-supplied file name to a safe base name.
/// Rejects anything that does not survive as a plain component.
fn sanitize_file_name(name: &str) -> Option<String> {
    let base = std::path::Path::new(name).file_name()?.to_str()?;
    if base.is_empty() || base == "." || base == ".." {
        return None;
    }
    Some(base.to_string())
}
