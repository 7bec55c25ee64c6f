//! Response shapes shared by the API handlers, and the mapping of store and
//! refresh errors onto HTTP statuses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::types::bookmark::Bookmark;
use crate::types::errors::{BookmarkError, RefreshError};
use crate::types::tag::TagSet;

/// Uniform body of every mutating endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusBody {
    pub status: u8,
    pub message: &'static str,
}

pub const SUCCESS: StatusBody = StatusBody {
    status: 0,
    message: "Success.",
};

pub const FAILURE: StatusBody = StatusBody {
    status: 1,
    message: "Failure.",
};

pub const NOT_FOUND_MESSAGE: &str = "This resource does not exist.";

pub fn success() -> Json<StatusBody> {
    Json(SUCCESS)
}

/// Bookmark as exposed over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookmarkView {
    pub url: String,
    pub title: String,
    pub description: String,
    pub tags: TagSet,
}

impl From<Bookmark> for BookmarkView {
    fn from(bookmark: Bookmark) -> Self {
        Self {
            url: bookmark.url,
            title: bookmark.title,
            description: bookmark.description,
            tags: bookmark.tags,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookmarkList {
    pub bookmarks: Vec<BookmarkView>,
}

impl From<Vec<Bookmark>> for BookmarkList {
    fn from(bookmarks: Vec<Bookmark>) -> Self {
        Self {
            bookmarks: bookmarks.into_iter().map(BookmarkView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TagList {
    pub tags: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected request; answered with the failure sentinel.
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found")]
    NotFound,
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(reason) => {
                debug!(%reason, "request rejected");
                (StatusCode::BAD_REQUEST, Json(FAILURE)).into_response()
            }
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "message": NOT_FOUND_MESSAGE })),
            )
                .into_response(),
            ApiError::Internal(reason) => {
                error!(%reason, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(FAILURE)).into_response()
            }
        }
    }
}

impl From<BookmarkError> for ApiError {
    fn from(err: BookmarkError) -> Self {
        match err {
            BookmarkError::DatabaseError(_) | BookmarkError::LockPoisoned => ApiError::Internal(err.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<RefreshError> for ApiError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::Store(inner) => inner.into(),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}
