use axum::{
    Extension, Json,
    extract::State,
};
use tracing::debug;
use uuid::Uuid;

use justice_types::api::{Claims, MessageBody, SendChatRequest};
use justice_types::models::Chat;

use crate::convert;
use crate::error::ApiError;
use crate::extract::{AppJson, AppPath};
use crate::state::{AppState, with_db};
use crate::validate::Checks;

/// GET /chats: every conversation the caller takes part in.
pub async fn list_chats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Chat>>, ApiError> {
    let rows = with_db(&state, move |db| db.list_chats_for_user(&claims.sub.to_string())).await?;
    Ok(Json(rows.into_iter().map(convert::chat).collect()))
}

/// GET /chats/{user_id}: the conversation between the caller and that user.
pub async fn get_chat_with(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Chat>, ApiError> {
    let row = with_db(&state, move |db| {
        db.find_chat_between(&claims.sub.to_string(), &user_id.to_string())
    })
    .await?
    .ok_or(ApiError::NotFound("Chat not found"))?;

    Ok(Json(convert::chat(row)))
}

/// POST /chats: create the pair's conversation, or overwrite its latest
/// message and mark it unread for the receiver.
pub async fn send_chat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<SendChatRequest>,
) -> Result<Json<Chat>, ApiError> {
    let receiver = req.receiver.to_string();
    let lookup = receiver.clone();
    if with_db(&state, move |db| db.get_user_by_id(&lookup)).await?.is_none() {
        return Err(ApiError::NotFound("Receiver not found"));
    }

    Checks::default()
        .required("message", &req.message, "Message is required")
        .check(req.receiver != claims.sub, "receiver", "Cannot start a chat with yourself")
        .finish()?;

    let sender = claims.sub.to_string();
    let message = req.message;
    let row = with_db(&state, move |db| {
        let chat_id = Uuid::new_v4().to_string();
        db.upsert_chat(&chat_id, &sender, &receiver, &message)
    })
    .await?;

    debug!("Chat {} updated by {}", row.id, claims.sub);
    Ok(Json(convert::chat(row)))
}

/// PUT /chats/{chat_id}/read: only the receiver may mark a chat read.
pub async fn mark_read(
    State(state): State<AppState>,
    AppPath(chat_id): AppPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageBody>, ApiError> {
    let row = with_db(&state, move |db| db.get_chat(&chat_id.to_string()))
        .await?
        .ok_or(ApiError::NotFound("Chat not found"))?;

    if row.receiver.id != claims.sub.to_string() {
        return Err(ApiError::Forbidden("Unauthorized"));
    }

    with_db(&state, move |db| db.mark_chat_read(&chat_id.to_string())).await?;
    Ok(Json(MessageBody::new("Chat read status updated")))
}
