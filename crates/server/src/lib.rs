//! HTTP layer for Shelf.
//!
//! This crate provides the HTTP control plane:
//! - Directory browsing and streamed file serving
//! - JSON listings with caller-scoped permissions
//! - Zip subtree downloads and archive member extraction
//! - Uploads and deletes gated by per-directory policies

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::{CallerIdentity, HeaderIdentityProvider, IdentityProvider, TraceId};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
