use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::{Form, FormRejection};
use serde::Deserialize;

use crate::api::response::{success, ApiError, StatusBody, TagList};
use crate::api::Result;
use crate::app::App;
use crate::managers::tag_manager::TagManagerTrait;
use crate::types::errors::BookmarkError;
use crate::types::tag::{TagInfo, TAG_DELIMITER};

pub fn router() -> Router<Arc<App>> {
    Router::new()
        .route("/api/tags", get(list_tags))
        .route("/api/tags/:tag", get(get_tag).put(rename_tag))
}

#[derive(Deserialize, Debug, Default)]
struct RenameForm {
    #[serde(default)]
    tags: Vec<String>,
}

async fn list_tags(State(app): State<Arc<App>>) -> Result<Json<TagList>> {
    let tags = app.tags().list_tags()?;
    Ok(Json(TagList { tags }))
}

async fn get_tag(State(app): State<Arc<App>>, Path(tag): Path<String>) -> Result<Json<TagInfo>> {
    match app.tags().get_tag(&tag) {
        Ok(info) => Ok(Json(info)),
        Err(BookmarkError::TagNotFound(_)) => Err(ApiError::NotFound),
        Err(err) => Err(err.into()),
    }
}

async fn rename_tag(
    State(app): State<Arc<App>>,
    Path(tag): Path<String>,
    form: std::result::Result<Form<RenameForm>, FormRejection>,
) -> Result<Json<StatusBody>> {
    let Form(form) = form.map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let new_raw = form.tags.join(TAG_DELIMITER.to_string().as_str());
    app.tags().rename_tag(&tag, &new_raw)?;
    Ok(success())
}
