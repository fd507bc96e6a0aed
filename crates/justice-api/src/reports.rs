use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use justice_db::models::{NewReport, ReportCommentRow};
use justice_types::api::{
    AddCommentRequest, Claims, CommentAdded, CreateReportRequest, MessageBody, UpdateReportRequest,
};
use justice_types::models::{Comment, CrimeReport};

use crate::convert::{self, parse_uuid};
use crate::error::ApiError;
use crate::extract::{AppJson, AppPath};
use crate::state::{AppState, with_db};
use crate::validate::{Checks, non_blank};

const NOT_FOUND: &str = "Crime report not found";

/// POST /reports/crime-reports
pub async fn create_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<CreateReportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Checks::default()
        .min_chars("title", &req.title, 5, "Title must be at least 5 characters long")
        .min_chars("description", &req.description, 10, "Description must be at least 10 characters long")
        .required("location", &req.location, "Location is required")
        .finish()?;

    let report_id = Uuid::new_v4();
    let author_id = claims.sub.to_string();
    let title = req.title.trim().to_string();
    let description = req.description.trim().to_string();
    let location = req.location.trim().to_string();
    let image = non_blank(req.image_url);
    let category = non_blank(req.category);
    let date = non_blank(req.date);

    let row = with_db(&state, move |db| {
        let id = report_id.to_string();
        db.insert_report(&NewReport {
            id: &id,
            author_id: &author_id,
            title: &title,
            description: &description,
            location: &location,
            category: category.as_deref(),
            image: image.as_deref(),
            date: date.as_deref(),
        })?;
        db.get_report(&id)
    })
    .await?
    .ok_or_else(|| anyhow::anyhow!("Report {} missing right after insert", report_id))?;

    info!("Crime report {} created by {}", report_id, claims.sub);
    Ok((StatusCode::CREATED, Json(convert::report(row, vec![]))))
}

/// GET /reports/crime-reports
pub async fn list_reports(State(state): State<AppState>) -> Result<Json<Vec<CrimeReport>>, ApiError> {
    let (rows, links) = with_db(&state, |db| {
        let rows = db.list_reports()?;
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let links = db.get_comment_ids(&ids)?;
        Ok((rows, links))
    })
    .await?;

    let mut comments = group_comment_ids(links);
    let reports = rows
        .into_iter()
        .map(|row| {
            let ids = comments.remove(&row.id).unwrap_or_default();
            convert::report(row, ids)
        })
        .collect();

    Ok(Json(reports))
}

/// GET /reports/crime-reports/{id}
pub async fn get_report(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<CrimeReport>, ApiError> {
    load_report(&state, id).await.map(Json)
}

/// PUT /reports/{id}: author only. Missing or blank fields keep their value.
pub async fn update_report(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<UpdateReportRequest>,
) -> Result<Json<CrimeReport>, ApiError> {
    let key = id.to_string();
    let existing = with_db(&state, move |db| db.get_report(&key))
        .await?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;

    if existing.author_id != claims.sub.to_string() {
        return Err(ApiError::Unauthorized("Not authorized to update this crime report"));
    }

    let title = non_blank(req.title).unwrap_or(existing.title);
    let description = non_blank(req.description).unwrap_or(existing.description);
    let location = non_blank(req.location).unwrap_or(existing.location);

    let key = id.to_string();
    let updated = with_db(&state, move |db| db.update_report(&key, &title, &description, &location)).await?;
    if !updated {
        return Err(ApiError::NotFound(NOT_FOUND));
    }

    info!("Crime report {} updated by {}", id, claims.sub);
    load_report(&state, id).await.map(Json)
}

/// DELETE /reports/{id}: author or admin.
pub async fn delete_report(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageBody>, ApiError> {
    let key = id.to_string();
    let existing = with_db(&state, move |db| db.get_report(&key))
        .await?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;

    if !claims.role.is_admin() && existing.author_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden("You are not authorized to delete this crime report"));
    }

    let key = id.to_string();
    with_db(&state, move |db| db.delete_report(&key)).await?;

    info!("Crime report {} deleted by {}", id, claims.sub);
    Ok(Json(MessageBody::new("Crime report deleted successfully")))
}

/// POST /reports/crime-reports/{id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<AddCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Checks::default()
        .required("text", &req.text, "Comment text is required")
        .finish()?;

    let comment_id = Uuid::new_v4();
    let author_id = claims.sub.to_string();
    let text = req.text.trim().to_string();

    let row = with_db(&state, move |db| {
        db.add_comment(&id.to_string(), &comment_id.to_string(), &author_id, &text)
    })
    .await?
    .ok_or(ApiError::NotFound(NOT_FOUND))?;

    Ok((
        StatusCode::CREATED,
        Json(CommentAdded {
            message: "Comment added to crime report".to_string(),
            comment: convert::comment(row),
        }),
    ))
}

/// GET /reports/crime-reports/{id}/comments, newest first.
pub async fn list_comments(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let rows = with_db(&state, move |db| {
        let key = id.to_string();
        if db.get_report(&key)?.is_none() {
            return Ok(None);
        }
        db.get_comments(&key).map(Some)
    })
    .await?
    .ok_or(ApiError::NotFound(NOT_FOUND))?;

    Ok(Json(rows.into_iter().map(convert::comment).collect()))
}

async fn load_report(state: &AppState, id: Uuid) -> Result<CrimeReport, ApiError> {
    let (row, links) = with_db(state, move |db| {
        let key = id.to_string();
        let Some(row) = db.get_report(&key)? else {
            return Ok(None);
        };
        let links = db.get_comment_ids(&[key])?;
        Ok(Some((row, links)))
    })
    .await?
    .ok_or(ApiError::NotFound(NOT_FOUND))?;

    let ids = group_comment_ids(links).remove(&row.id).unwrap_or_default();
    Ok(convert::report(row, ids))
}

/// Group comment links by report, keeping the newest-first order the DB returned.
fn group_comment_ids(links: Vec<ReportCommentRow>) -> HashMap<String, Vec<Uuid>> {
    let mut grouped: HashMap<String, Vec<Uuid>> = HashMap::new();
    for link in links {
        let comment_id = parse_uuid(&link.comment_id, "comment id");
        grouped.entry(link.report_id).or_default().push(comment_id);
    }
    grouped
}
