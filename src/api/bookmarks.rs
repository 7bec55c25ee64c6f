use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::{Form, FormRejection, Query, QueryRejection};
use serde::Deserialize;

use crate::api::response::{success, ApiError, BookmarkList, BookmarkView, StatusBody};
use crate::api::Result;
use crate::app::App;
use crate::managers::bookmark_store::BookmarkStoreTrait;
use crate::types::bookmark::{BookmarkUpdate, NewBookmark, SearchQuery};
use crate::types::tag::TagSet;

pub fn router() -> Router<Arc<App>> {
    Router::new()
        .route("/api/bookmarks", get(list_bookmarks).post(create_bookmark).delete(delete_all_bookmarks))
        .route("/api/bookmarks/search", get(search_bookmarks))
        .route("/api/bookmarks/refresh", post(refresh_all_bookmarks))
        .route(
            "/api/bookmarks/:id",
            get(get_bookmark).put(update_bookmark).delete(delete_bookmark),
        )
        .route("/api/bookmarks/:id/refresh", post(refresh_bookmark))
}

/// Form body for create and update. `tags` may be repeated; each value is a
/// comma-delimited list.
#[derive(Deserialize, Debug, Default)]
struct BookmarkForm {
    url: Option<String>,
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

impl BookmarkForm {
    fn tags(&self) -> Option<TagSet> {
        if self.tags.is_empty() {
            None
        } else {
            Some(TagSet::parse_all(&self.tags))
        }
    }
}

#[derive(Deserialize, Debug, Default)]
struct SearchParams {
    #[serde(default)]
    keywords: Vec<String>,
    all_keywords: Option<String>,
    deep: Option<String>,
}

fn is_truthy(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

fn parse_id(raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::BadRequest(format!("invalid bookmark id: {}", raw)))
}

async fn list_bookmarks(State(app): State<Arc<App>>) -> Result<Json<BookmarkList>> {
    Ok(Json(app.store.get_all()?.into()))
}

async fn create_bookmark(
    State(app): State<Arc<App>>,
    form: std::result::Result<Form<BookmarkForm>, FormRejection>,
) -> Result<Json<StatusBody>> {
    let Form(form) = form.map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let tags = form.tags().unwrap_or_default();
    let url = form
        .url
        .ok_or_else(|| ApiError::BadRequest("url is required".to_string()))?;

    let mut new = NewBookmark::new(url).with_tags(tags);
    new.title = form.title;
    new.description = form.description;
    app.store.create(new)?;
    Ok(success())
}

async fn delete_all_bookmarks(State(app): State<Arc<App>>) -> Result<Json<StatusBody>> {
    app.store.delete_all()?;
    Ok(success())
}

async fn search_bookmarks(
    State(app): State<Arc<App>>,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<BookmarkList>> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let query = SearchQuery {
        keywords: params.keywords,
        all_keywords: is_truthy(params.all_keywords.as_deref()),
        deep: is_truthy(params.deep.as_deref()),
    };
    Ok(Json(app.store.search(&query)?.into()))
}

/// Succeeds when at least one bookmark got a new title.
async fn refresh_all_bookmarks(State(app): State<Arc<App>>) -> Result<Json<StatusBody>> {
    let reports = app.refresher.refresh_all().await;
    if reports.iter().any(|report| report.is_success()) {
        Ok(success())
    } else {
        Err(ApiError::BadRequest("no bookmark was refreshed".to_string()))
    }
}

async fn get_bookmark(State(app): State<Arc<App>>, Path(id): Path<String>) -> Result<Json<BookmarkView>> {
    let id = parse_id(&id)?;
    Ok(Json(app.store.get(id)?.into()))
}

async fn update_bookmark(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
    form: std::result::Result<Form<BookmarkForm>, FormRejection>,
) -> Result<Json<StatusBody>> {
    let id = parse_id(&id)?;
    let Form(form) = form.map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let update = BookmarkUpdate {
        tags: form.tags(),
        url: form.url,
        title: form.title,
        description: form.description,
    };
    if update.is_empty() {
        return Err(ApiError::BadRequest("nothing to update".to_string()));
    }
    app.store.update(id, update)?;
    Ok(success())
}

async fn delete_bookmark(State(app): State<Arc<App>>, Path(id): Path<String>) -> Result<Json<StatusBody>> {
    let id = parse_id(&id)?;
    app.store.delete(id)?;
    Ok(success())
}

async fn refresh_bookmark(State(app): State<Arc<App>>, Path(id): Path<String>) -> Result<Json<StatusBody>> {
    let id = parse_id(&id)?;
    app.refresher.refresh(id).await?;
    Ok(success())
}
