//! HTTP API for markshelf.
//!
//! Request bodies are URL-encoded forms; responses are JSON. Mutating
//! endpoints answer with the [`response::SUCCESS`] or [`response::FAILURE`]
//! status body.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::app::App;

pub use response::ApiError;

mod bookmarks;
pub mod response;
mod tags;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Builds the full API router over `app`.
pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .route("/", get(home))
        .merge(bookmarks::router())
        .merge(tags::router())
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

#[derive(Debug, Serialize)]
struct Home {
    name: &'static str,
    version: &'static str,
    bookmarks: usize,
}

async fn home(State(app): State<Arc<App>>) -> Result<Json<Home>> {
    Ok(Json(Home {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        bookmarks: app.store.len()?,
    }))
}
