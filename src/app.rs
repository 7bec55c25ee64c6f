//! App Core for markshelf.
//!
//! Central struct holding the bookmark store and the refresh worker.

use std::sync::Arc;

use tracing::info;

use crate::config::{Config, RefreshConfiguration};
use crate::managers::bookmark_store::BookmarkStore;
use crate::managers::tag_manager::TagManager;
use crate::services::refresh_worker::{HttpPageFetcher, PageFetcher, RefreshWorker};

/// Central application struct shared by every request handler.
///
/// `TagManager` borrows the store with a lifetime, so it is created on demand
/// via [`App::tags`].
pub struct App {
    pub store: Arc<BookmarkStore>,
    pub refresher: RefreshWorker,
}

impl App {
    /// Opens the configured database and builds the HTTP page fetcher.
    pub fn new(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate()?;
        let store = Arc::new(BookmarkStore::open(&config.db.path)?);
        let fetcher = HttpPageFetcher::new(&config.refresh.user_agent, config.refresh.timeout)?;
        info!(db = %config.db.path.display(), "markshelf initialised");
        Ok(Self::with_fetcher(store, Arc::new(fetcher), &config.refresh))
    }

    /// Assembles an app over an existing store and any page fetcher.
    pub fn with_fetcher(
        store: Arc<BookmarkStore>,
        fetcher: Arc<dyn PageFetcher>,
        refresh: &RefreshConfiguration,
    ) -> Self {
        let refresher = RefreshWorker::new(store.clone(), fetcher, refresh.concurrency, refresh.timeout);
        Self { store, refresher }
    }

    pub fn tags(&self) -> TagManager<'_> {
        TagManager::new(&self.store)
    }
}
