use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use justice_types::api::{Claims, CreateStoryRequest, MessageBody};
use justice_types::models::Story;

use crate::convert;
use crate::error::ApiError;
use crate::extract::{AppJson, AppPath};
use crate::state::{AppState, with_db};
use crate::validate::Checks;

const NOT_FOUND: &str = "Story not found";

pub async fn create_story(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<CreateStoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Checks::default()
        .min_chars("title", &req.title, 3, "Title must be at least 3 characters long")
        .min_chars("body", &req.body, 10, "Story must be at least 10 characters long")
        .finish()?;

    let story_id = Uuid::new_v4();
    let author_id = claims.sub.to_string();
    let title = req.title.trim().to_string();
    let body = req.body.trim().to_string();

    let row = with_db(&state, move |db| {
        let id = story_id.to_string();
        db.insert_story(&id, &author_id, &title, &body)?;
        db.get_story(&id)
    })
    .await?
    .ok_or_else(|| anyhow::anyhow!("Story {} missing right after insert", story_id))?;

    info!("Story {} created by {}", story_id, claims.sub);
    Ok((StatusCode::CREATED, Json(convert::story(row))))
}

pub async fn list_stories(State(state): State<AppState>) -> Result<Json<Vec<Story>>, ApiError> {
    let rows = with_db(&state, |db| db.list_stories()).await?;
    Ok(Json(rows.into_iter().map(convert::story).collect()))
}

pub async fn get_story(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Story>, ApiError> {
    let row = with_db(&state, move |db| db.get_story(&id.to_string()))
        .await?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;
    Ok(Json(convert::story(row)))
}

/// DELETE /stories/{id}: author or admin.
pub async fn delete_story(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageBody>, ApiError> {
    let row = with_db(&state, move |db| db.get_story(&id.to_string()))
        .await?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;

    if !claims.role.is_admin() && row.author_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden("You are not authorized to delete this story"));
    }

    with_db(&state, move |db| db.delete_story(&id.to_string())).await?;
    Ok(Json(MessageBody::new("Story deleted successfully")))
}
