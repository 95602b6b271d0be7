//! Route configuration.

use crate::auth::identity_middleware;
use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let service_routes = Router::new()
        // Server status (intentionally unauthenticated)
        .route("/-/status", get(handlers::get_status))
        // JSON listings
        .route("/-/json/{*path}", get(handlers::json_listing))
        .route("/-/json/", get(handlers::json_listing_root))
        .route("/-/json", get(handlers::json_listing_root))
        // Archive endpoints
        .route("/-/zip/{*path}", get(handlers::zip_subtree))
        .route("/-/zip/", get(handlers::zip_root))
        .route("/-/zip", get(handlers::zip_root))
        // The member path is embedded after a "/-/" separator, so the whole
        // tail is captured and split in the handler.
        .route("/-/unzip/{*rest}", get(handlers::unzip_member))
        // Single-file info
        .route("/-/info/{*path}", get(handlers::file_info));

    let content_routes = Router::new()
        .route(
            "/",
            get(handlers::browse_root).post(handlers::upload_root),
        )
        .route(
            "/{*path}",
            get(handlers::browse)
                .post(handlers::upload)
                .delete(handlers::delete_path),
        );

    let max_upload = state.config.server.max_upload_bytes as usize;

    Router::new()
        .merge(service_routes)
        .merge(content_routes)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            identity_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
