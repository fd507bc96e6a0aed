use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use justice_types::api::{Claims, CreateFactRequest, MessageBody};
use justice_types::models::Fact;

use crate::convert;
use crate::error::ApiError;
use crate::extract::{AppJson, AppPath};
use crate::middleware::require_admin;
use crate::state::{AppState, with_db};
use crate::validate::{Checks, non_blank};

pub async fn list_facts(State(state): State<AppState>) -> Result<Json<Vec<Fact>>, ApiError> {
    let rows = with_db(&state, |db| db.list_facts()).await?;
    Ok(Json(rows.into_iter().map(convert::fact).collect()))
}

/// POST /facts (admin)
pub async fn create_fact(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<CreateFactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;
    Checks::default()
        .required("title", &req.title, "Title is required")
        .required("text", &req.text, "Text is required")
        .finish()?;

    let fact_id = Uuid::new_v4();
    let title = req.title.trim().to_string();
    let text = req.text.trim().to_string();
    let source = non_blank(req.source);

    let row = with_db(&state, move |db| {
        let id = fact_id.to_string();
        db.insert_fact(&id, &title, &text, source.as_deref())?;
        db.get_fact(&id)
    })
    .await?
    .ok_or_else(|| anyhow::anyhow!("Fact {} missing right after insert", fact_id))?;

    info!("Fact {} added by {}", fact_id, claims.sub);
    Ok((StatusCode::CREATED, Json(convert::fact(row))))
}

/// DELETE /facts/{id} (admin)
pub async fn delete_fact(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageBody>, ApiError> {
    require_admin(&claims)?;

    if !with_db(&state, move |db| db.delete_fact(&id.to_string())).await? {
        return Err(ApiError::NotFound("Fact not found"));
    }
    Ok(Json(MessageBody::new("Fact deleted successfully")))
}
