use std::time::Duration;

use thiserror::Error;

// === BookmarkError ===

/// Errors related to bookmark and tag operations on the record store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookmarkError {
    /// Bookmark with the given ID was not found.
    #[error("Bookmark not found: {0}")]
    NotFound(u64),
    /// A bookmark with the same URL already exists.
    #[error("Duplicate bookmark URL: {0}")]
    DuplicateUrl(String),
    /// No bookmark references the given tag.
    #[error("Tag not found: {0}")]
    TagNotFound(String),
    /// The request carried malformed or missing input.
    #[error("Invalid bookmark input: {0}")]
    InvalidInput(String),
    /// Database operation failed.
    #[error("Bookmark database error: {0}")]
    DatabaseError(String),
    /// A thread panicked while holding the store lock.
    #[error("Bookmark store lock poisoned")]
    LockPoisoned,
}

impl From<rusqlite::Error> for BookmarkError {
    fn from(err: rusqlite::Error) -> Self {
        BookmarkError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for BookmarkError {
    fn from(err: serde_json::Error) -> Self {
        BookmarkError::DatabaseError(format!("tag column encoding: {}", err))
    }
}

// === RefreshError ===

/// Errors related to refreshing a bookmark's title from its page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// Bookmark with the given ID was not found.
    #[error("Bookmark not found: {0}")]
    NotFound(u64),
    /// The page could not be fetched.
    #[error("Refresh network error: {0}")]
    Network(String),
    /// The fetch did not finish within the deadline.
    #[error("Refresh timed out after {0:?}")]
    Timeout(Duration),
    /// The server answered with a non-success status.
    #[error("Refresh failed with HTTP status {0}")]
    HttpStatus(u16),
    /// The response is not an HTML document.
    #[error("Refresh target is not HTML: {0}")]
    NotHtml(String),
    /// The page has no usable `<title>`.
    #[error("Page has no title")]
    NoTitle,
    /// The bookmark's URL changed while its page was being fetched.
    #[error("Bookmark {0} changed URL during refresh")]
    UrlChanged(u64),
    /// Writing the refreshed title failed.
    #[error("Refresh store error: {0}")]
    Store(BookmarkError),
}

impl From<BookmarkError> for RefreshError {
    fn from(err: BookmarkError) -> Self {
        match err {
            BookmarkError::NotFound(id) => RefreshError::NotFound(id),
            other => RefreshError::Store(other),
        }
    }
}

// === ConfigError ===

/// Errors related to startup configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The provided setting value is invalid.
    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}
