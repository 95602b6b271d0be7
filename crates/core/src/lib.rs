//! Core domain types and shared logic for Shelf.
//!
//! This crate defines the data model used across all other crates:
//! - Application configuration
//! - Access policies, sidecar overlays, and filename pattern rules
//! - Caller identity

pub mod config;
pub mod error;
pub mod policy;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use policy::{AccessPolicy, Identity, PathRule, PatternCache, SidecarConfig, UserOverride};

/// Sidecar file name recognized in every served directory.
pub const SIDECAR_FILE_NAME: &str = ".shelf.yml";

/// Maximum number of search results a listing returns.
pub const MAX_SEARCH_RESULTS: usize = 50;

/// Maximum number of single-child folding hops in a directory listing.
pub const MAX_FOLD_HOPS: usize = 5;

/// Size reported for directory entries in listings (files report byte sizes).
pub const DIRECTORY_SIZE_SENTINEL: i64 = -1;
