//! Zip download and archive member extraction endpoints.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use shelf_storage::paths;
use std::io::{Seek, SeekFrom, Write};
use tokio_util::io::ReaderStream;

/// Bounded chunk channel between the blocking extraction thread and the
/// response body. Small on purpose: extraction pauses when the client reads
/// slowly instead of buffering ahead.
const EXTRACT_CHANNEL_CAPACITY: usize = 8;

/// GET /-/zip/{path} — stream a zip archive of the subtree.
///
/// The zip writer needs a seekable sink, so entries are spooled into an
/// unlinked temp file as the walk visits them and the spool is then streamed
/// to the client; memory use stays flat regardless of subtree size.
pub async fn zip_subtree(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<Response> {
    zip_response(state, path).await
}

/// GET /-/zip/ — zip archive of the whole served root.
pub async fn zip_root(State(state): State<AppState>) -> ApiResult<Response> {
    zip_response(state, String::new()).await
}

async fn zip_response(state: AppState, path: String) -> ApiResult<Response> {
    let normalized = paths::normalize(&path)?;
    let archives = state.archives.clone();
    let subtree = normalized.clone();

    let spool = tokio::task::spawn_blocking(move || -> Result<std::fs::File, ApiError> {
        let mut spool = tempfile::tempfile().map_err(shelf_storage::StorageError::from)?;
        archives.create_zip(&subtree, &mut spool)?;
        spool
            .seek(SeekFrom::Start(0))
            .map_err(shelf_storage::StorageError::from)?;
        Ok(spool)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("zip task failed: {e}")))??;

    let file = tokio::fs::File::from_std(spool);
    let size = file
        .metadata()
        .await
        .map_err(|err| ApiError::Storage(err.into()))?
        .len();

    let base = paths::base_name(&normalized);
    let archive_name = if base.is_empty() { "root" } else { base };

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/zip".to_string()),
            (CONTENT_LENGTH, size.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{archive_name}.zip\""),
            ),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

/// GET /-/unzip/{zipPath}/-/{memberPath} — stream one member's decompressed
/// bytes.
///
/// The member is probed first so a missing archive or member fails with a
/// clean status before any body bytes are committed; the bytes then flow
/// through a bounded channel from the blocking extraction thread straight
/// into the response body.
pub async fn unzip_member(
    State(state): State<AppState>,
    Path(rest): Path<String>,
) -> ApiResult<Response> {
    let (zip_path, member) = rest.split_once("/-/").ok_or_else(|| {
        ApiError::BadRequest("expected /-/unzip/{archive}/-/{member}".to_string())
    })?;
    let zip_path = zip_path.to_string();
    let member = member.to_string();

    // Probe for existence and the decompressed size up front.
    let size = {
        let archives = state.archives.clone();
        let zip_path = zip_path.clone();
        let member = member.clone();
        tokio::task::spawn_blocking(move || archives.member_size(&zip_path, &member))
            .await
            .map_err(|e| ApiError::Internal(format!("archive probe failed: {e}")))??
    };

    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Bytes, std::io::Error>>(
        EXTRACT_CHANNEL_CAPACITY,
    );
    let archives = state.archives.clone();
    let content_type = mime_guess::from_path(&member).first_or_octet_stream();

    tokio::task::spawn_blocking(move || {
        let sink = ChannelWriter { tx: tx.clone() };
        if let Err(err) = archives.extract_member(&zip_path, &member, sink) {
            // A disconnecting client lands here as a broken pipe; report and
            // stop, never retry.
            tracing::warn!(
                archive = %zip_path,
                member = %member,
                error = %err,
                "archive extraction aborted"
            );
            let _ = tx.blocking_send(Err(std::io::Error::other(err.to_string())));
        }
    });

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    });

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, content_type.essence_str().to_string()),
            (CONTENT_LENGTH, size.to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

/// Write adapter pushing chunks into the response channel. Blocks (on the
/// blocking pool) when the client reads slower than extraction produces.
struct ChannelWriter {
    tx: tokio::sync::mpsc::Sender<Result<Bytes, std::io::Error>>,
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.tx
            .blocking_send(Ok(Bytes::copy_from_slice(buf)))
            .map_err(|_| {
                std::io::Error::new(std::io::ErrorKind::BrokenPipe, "client disconnected")
            })?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
