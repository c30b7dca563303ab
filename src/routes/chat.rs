use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{chat_dto::SendMessagePayload, connection_dto::UnreadCountResponse},
    error::{Error, Result},
    models::chat::Chat,
    session::Session,
    AppState,
};

#[axum::debug_handler]
pub async fn list_chats(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse> {
    let chats = state.chat_service.list_chats_for_user(&session).await?;
    Ok(Json(chats))
}

#[axum::debug_handler]
pub async fn unread_count(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse> {
    let count = state.chat_service.total_unread_messages(&session).await?;
    Ok(Json(UnreadCountResponse { count }))
}

#[axum::debug_handler]
pub async fn chat_with_user(
    State(state): State<AppState>,
    session: Session,
    Path(other_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user_id = session.require_user()?;
    let chat = state
        .chat_service
        .get_chat_by_users(user_id, other_id)
        .await?
        .ok_or_else(|| Error::NotFound("No chat with this user".to_string()))?;
    Ok(Json(chat))
}

#[axum::debug_handler]
pub async fn list_messages(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    participant_chat(&state, &session, id).await?;
    let messages = state.chat_service.list_messages(id).await?;
    Ok(Json(messages))
}

#[axum::debug_handler]
pub async fn send_message(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<Response> {
    payload.validate()?;
    participant_chat(&state, &session, id).await?;
    let sent = state
        .chat_service
        .send_message(&session, id, &payload.content)
        .await?;
    Ok(match sent {
        Some(message) => (StatusCode::CREATED, Json(message)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    })
}

#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    participant_chat(&state, &session, id).await?;
    state.chat_service.mark_chat_as_read(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn participant_chat(state: &AppState, session: &Session, chat_id: Uuid) -> Result<Chat> {
    let user_id = session.require_user()?;
    let chat = state
        .chat_service
        .get_chat(chat_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Chat {} not found", chat_id)))?;
    if chat.slot_of(user_id).is_none() {
        return Err(Error::Forbidden("not a participant of this chat".to_string()));
    }
    Ok(chat)
}
