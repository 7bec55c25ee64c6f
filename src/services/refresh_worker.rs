//! Refresh Worker for markshelf.
//!
//! Re-derives a bookmark's title by fetching its page. The store lock is
//! never held across the network call: the url is read, the page fetched
//! unlocked, and the title written back only if the url is still the same.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::header::CONTENT_TYPE;
use tracing::{info, warn};

use crate::managers::bookmark_store::{BookmarkStore, BookmarkStoreTrait};
use crate::services::page_title::extract_title;
use crate::types::errors::RefreshError;

/// Source of page titles.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_title(&self, url: &str) -> Result<String, RefreshError>;
}

/// `PageFetcher` that performs an HTTP GET with `reqwest`.
pub struct HttpPageFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpPageFetcher {
    /// Builds a client sending `user_agent` and giving up after `timeout`.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, RefreshError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| RefreshError::Network(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    fn map_error(&self, err: reqwest::Error) -> RefreshError {
        if err.is_timeout() {
            RefreshError::Timeout(self.timeout)
        } else {
            RefreshError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_title(&self, url: &str) -> Result<String, RefreshError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::HttpStatus(status.as_u16()));
        }

        if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
            let content_type = content_type.to_str().unwrap_or_default().to_ascii_lowercase();
            if !content_type.contains("html") {
                return Err(RefreshError::NotHtml(content_type));
            }
        }

        let body = response.text().await.map_err(|e| self.map_error(e))?;
        extract_title(&body).ok_or(RefreshError::NoTitle)
    }
}

/// Result of refreshing one bookmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub id: u64,
    pub url: String,
    /// The new title, or why the record was left untouched.
    pub outcome: Result<String, RefreshError>,
}

impl RefreshReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Refreshes bookmark titles from their pages.
#[derive(Clone)]
pub struct RefreshWorker {
    store: Arc<BookmarkStore>,
    fetcher: Arc<dyn PageFetcher>,
    concurrency: usize,
    timeout: Duration,
}

impl RefreshWorker {
    pub fn new(
        store: Arc<BookmarkStore>,
        fetcher: Arc<dyn PageFetcher>,
        concurrency: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            fetcher,
            concurrency: concurrency.max(1),
            timeout,
        }
    }

    /// Refreshes bookmark `id`, returning its new title.
    ///
    /// Fetch failures leave the record untouched.
    pub async fn refresh(&self, id: u64) -> Result<String, RefreshError> {
        let url = self.store.get(id)?.url;
        let title = self.refresh_one(id, &url).await?;
        info!(id, title = %title, "bookmark refreshed");
        Ok(title)
    }

    /// Refreshes every bookmark, at most `concurrency` fetches at a time.
    ///
    /// One report per record, ordered by id. A failure affects only its own record.
    pub async fn refresh_all(&self) -> Vec<RefreshReport> {
        let targets: Vec<(u64, String)> = match self.store.get_all() {
            Ok(bookmarks) => bookmarks.into_iter().map(|b| (b.id, b.url)).collect(),
            Err(err) => {
                warn!(error = %err, "could not list bookmarks for refresh");
                return Vec::new();
            }
        };

        let mut reports: Vec<RefreshReport> = stream::iter(targets)
            .map(|(id, url)| async move {
                let outcome = self.refresh_one(id, &url).await;
                RefreshReport { id, url, outcome }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        reports.sort_by_key(|report| report.id);

        let refreshed = reports.iter().filter(|r| r.is_success()).count();
        info!(refreshed, failed = reports.len() - refreshed, "refresh pass finished");
        reports
    }

    async fn refresh_one(&self, id: u64, url: &str) -> Result<String, RefreshError> {
        let title = self.fetch(url).await;
        let outcome = match title {
            Ok(title) => match self.store.set_title_if_url(id, url, &title) {
                Ok(true) => Ok(title),
                Ok(false) => Err(RefreshError::UrlChanged(id)),
                Err(err) => Err(err.into()),
            },
            Err(err) => Err(err),
        };
        if let Err(err) = &outcome {
            warn!(id, url, error = %err, "bookmark refresh failed");
        }
        outcome
    }

    /// Fetches the title of `url`, bounded by the configured timeout.
    async fn fetch(&self, url: &str) -> Result<String, RefreshError> {
        match tokio::time::timeout(self.timeout, self.fetcher.fetch_title(url)).await {
            Ok(result) => result,
            Err(_) => Err(RefreshError::Timeout(self.timeout)),
        }
    }
}
