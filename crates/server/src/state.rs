//! Application state shared across handlers.

use crate::auth::{HeaderIdentityProvider, IdentityProvider};
use shelf_core::AppConfig;
use shelf_core::policy::PatternCache;
use shelf_storage::{ArchiveStreamer, ListingAggregator, PathAuthorizer, SearchIndex};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Access-policy resolver over the served root.
    pub authorizer: Arc<PathAuthorizer>,
    /// Background-built search index.
    pub index: Arc<SearchIndex>,
    /// Listing aggregator.
    pub listings: Arc<ListingAggregator>,
    /// Zip creation/extraction.
    pub archives: Arc<ArchiveStreamer>,
    /// Caller identity resolution.
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// # Panics
    ///
    /// Panics if configuration validation fails; the binary validates before
    /// building state, so this only trips on programmer error in tests and
    /// embedders.
    pub fn new(config: AppConfig) -> Self {
        if let Err(error) = config.validate() {
            panic!("invalid configuration: {error}");
        }

        let root = config.files.root.clone();
        let patterns = Arc::new(PatternCache::new());
        let authorizer = Arc::new(PathAuthorizer::new(
            &root,
            config.access.upload,
            config.access.delete,
            patterns,
        ));
        let index = Arc::new(SearchIndex::new(&root));
        let listings = Arc::new(ListingAggregator::new(&root, index.clone()));
        let archives = Arc::new(ArchiveStreamer::new(&root));
        let identity: Arc<dyn IdentityProvider> = Arc::new(HeaderIdentityProvider::new(
            config.server.identity_header.clone(),
        ));

        Self {
            config: Arc::new(config),
            authorizer,
            index,
            listings,
            archives,
            identity,
        }
    }

    /// Replace the identity provider (for embedders and tests).
    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity = provider;
        self
    }
}
