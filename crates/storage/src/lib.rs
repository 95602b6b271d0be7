//! Filesystem-facing services for Shelf.
//!
//! This crate implements the pieces that touch the served tree:
//! - Hierarchical access-policy resolution over directory sidecar files
//! - The background search index with atomic snapshot publication
//! - Directory-listing aggregation with single-child folding
//! - Streaming zip creation and archive member extraction

pub mod archive;
pub mod authorizer;
pub mod error;
pub mod index;
pub mod listing;
pub mod paths;

pub use archive::ArchiveStreamer;
pub use authorizer::PathAuthorizer;
pub use error::{StorageError, StorageResult};
pub use index::{IndexEntry, IndexSnapshot, SearchIndex};
pub use listing::{EntryKind, ListingAggregator, ListingEntry};
