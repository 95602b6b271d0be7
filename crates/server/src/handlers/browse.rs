//! Browsing and streamed file serving.

use crate::auth::CallerIdentity;
use crate::error::{ApiError, ApiResult};
use crate::handlers::listing::build_listing;
use crate::state::AppState;
use axum::Json;
use axum::body::Body;
use axum::extract::{Extension, Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use shelf_storage::paths;
use tokio_util::io::ReaderStream;

/// Query parameters accepted by the browse endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    /// Token query; switches directory views to the search index.
    pub search: Option<String>,
    /// When true, file responses carry an attachment disposition.
    pub download: Option<bool>,
}

/// GET /{path} — JSON listing for directories and searches, streamed file
/// bytes otherwise.
pub async fn browse(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<BrowseQuery>,
    Extension(caller): Extension<CallerIdentity>,
) -> ApiResult<Response> {
    let normalized = paths::normalize(&path)?;

    if query.search.as_deref().is_some_and(|s| !s.trim().is_empty()) {
        let listing = build_listing(&state, &normalized, query.search.as_deref(), &caller).await?;
        return Ok(Json(listing).into_response());
    }

    let fs_path = paths::to_fs_path(&state.config.files.root, &normalized);
    let meta = tokio::fs::metadata(&fs_path).await.map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            ApiError::NotFound(format!("no such file or directory: /{normalized}"))
        } else {
            ApiError::Storage(err.into())
        }
    })?;

    if meta.is_dir() {
        let listing = build_listing(&state, &normalized, None, &caller).await?;
        return Ok(Json(listing).into_response());
    }

    serve_file(fs_path, &normalized, meta.len(), query.download.unwrap_or(false)).await
}

/// GET / — listing of the served root.
pub async fn browse_root(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
    Extension(caller): Extension<CallerIdentity>,
) -> ApiResult<Response> {
    let listing = build_listing(&state, "", query.search.as_deref(), &caller).await?;
    Ok(Json(listing).into_response())
}

/// Stream a file's bytes with a guessed content type.
async fn serve_file(
    fs_path: std::path::PathBuf,
    normalized: &str,
    size: u64,
    download: bool,
) -> ApiResult<Response> {
    let file = tokio::fs::File::open(&fs_path)
        .await
        .map_err(|err| ApiError::Storage(err.into()))?;

    let mime = mime_guess::from_path(normalized).first_or_octet_stream();
    let mut response = (
        StatusCode::OK,
        [
            (CONTENT_TYPE, mime.essence_str().to_string()),
            (CONTENT_LENGTH, size.to_string()),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response();

    if download {
        let file_name = paths::base_name(normalized);
        let disposition = format!("attachment; filename=\"{}\"", sanitize_quoted(file_name));
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            response.headers_mut().insert(CONTENT_DISPOSITION, value);
        }
    }

    Ok(response)
}

/// Strip characters that would break a quoted header parameter.
fn sanitize_quoted(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect()
}
