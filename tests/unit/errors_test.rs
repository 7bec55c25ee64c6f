use std::time::Duration;

use markshelf::types::errors::*;

// === BookmarkError Tests ===

#[test]
fn bookmark_error_display_variants() {
    assert_eq!(BookmarkError::NotFound(7).to_string(), "Bookmark not found: 7");
    assert_eq!(
        BookmarkError::DuplicateUrl("http://google.com".to_string()).to_string(),
        "Duplicate bookmark URL: http://google.com"
    );
    assert_eq!(
        BookmarkError::TagNotFound("rust".to_string()).to_string(),
        "Tag not found: rust"
    );
    assert_eq!(
        BookmarkError::InvalidInput("url is required".to_string()).to_string(),
        "Invalid bookmark input: url is required"
    );
    assert_eq!(
        BookmarkError::DatabaseError("disk full".to_string()).to_string(),
        "Bookmark database error: disk full"
    );
    assert_eq!(BookmarkError::LockPoisoned.to_string(), "Bookmark store lock poisoned");
}

#[test]
fn bookmark_error_from_rusqlite() {
    let err: BookmarkError = rusqlite::Error::QueryReturnedNoRows.into();
    assert!(matches!(err, BookmarkError::DatabaseError(_)));
}

#[test]
fn bookmark_error_from_serde_json() {
    let json_err = serde_json::from_str::<Vec<String>>("not json").unwrap_err();
    let err: BookmarkError = json_err.into();
    match err {
        BookmarkError::DatabaseError(msg) => assert!(msg.starts_with("tag column encoding")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn bookmark_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(BookmarkError::NotFound(1));
    assert!(err.source().is_none());
}

// === RefreshError Tests ===

#[test]
fn refresh_error_display_variants() {
    assert_eq!(
        RefreshError::Timeout(Duration::from_secs(3)).to_string(),
        "Refresh timed out after 3s"
    );
    assert_eq!(RefreshError::HttpStatus(503).to_string(), "Refresh failed with HTTP status 503");
    assert_eq!(RefreshError::NoTitle.to_string(), "Page has no title");
    assert_eq!(
        RefreshError::UrlChanged(4).to_string(),
        "Bookmark 4 changed URL during refresh"
    );
    assert_eq!(
        RefreshError::NotHtml("application/pdf".to_string()).to_string(),
        "Refresh target is not HTML: application/pdf"
    );
}

#[test]
fn refresh_error_from_bookmark_error() {
    assert_eq!(
        RefreshError::from(BookmarkError::NotFound(9)),
        RefreshError::NotFound(9)
    );
    assert_eq!(
        RefreshError::from(BookmarkError::LockPoisoned),
        RefreshError::Store(BookmarkError::LockPoisoned)
    );
}

// === ConfigError Tests ===

#[test]
fn config_error_display() {
    let err = ConfigError::InvalidValue {
        key: "port",
        reason: "must be between 1 and 65535".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Invalid configuration value for port: must be between 1 and 65535"
    );
}
