//! JSON directory listings.

use crate::auth::CallerIdentity;
use crate::error::ApiResult;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use serde::{Deserialize, Serialize};
use shelf_core::policy::AccessPolicy;
use shelf_storage::ListingEntry;

/// Query parameters accepted by listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    /// Token query routed through the search index when non-empty.
    pub search: Option<String>,
}

/// JSON listing response: entries plus the caller-scoped policy.
#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub files: Vec<ListingEntry>,
    pub auth: AccessPolicy,
}

/// GET /-/json/{path}?search=...
pub async fn json_listing(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<ListingQuery>,
    Extension(caller): Extension<CallerIdentity>,
) -> ApiResult<Json<ListingResponse>> {
    Ok(Json(
        build_listing(&state, &path, query.search.as_deref(), &caller).await?,
    ))
}

/// GET /-/json/ — listing of the served root.
pub async fn json_listing_root(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
    Extension(caller): Extension<CallerIdentity>,
) -> ApiResult<Json<ListingResponse>> {
    Ok(Json(
        build_listing(&state, "", query.search.as_deref(), &caller).await?,
    ))
}

/// Shared listing assembly: resolve the policy, aggregate entries, then
/// recompute the policy's upload/delete flags against the caller identity so
/// displayed affordances match what the mutation endpoints enforce.
pub(crate) async fn build_listing(
    state: &AppState,
    path: &str,
    search: Option<&str>,
    caller: &CallerIdentity,
) -> ApiResult<ListingResponse> {
    let policy = state.authorizer.resolve(path).await?;
    let files = state
        .listings
        .list(path, search, &policy, &state.authorizer)
        .await?;

    let mut auth = policy;
    auth.allow_upload = auth.can_upload(caller.0.as_ref());
    auth.allow_delete = auth.can_delete(caller.0.as_ref());

    Ok(ListingResponse { files, auth })
}
