use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::{
    dto::connection_dto::{ConnectionSide, MarkReadPayload, MarkReadResponse, UnreadCountResponse},
    error::{Error, Result},
    session::Session,
    AppState,
};

#[axum::debug_handler]
pub async fn list_connections(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse> {
    let connections = state
        .connection_service
        .list_connections_for_user(&session)
        .await?;
    Ok(Json(connections))
}

#[axum::debug_handler]
pub async fn list_pending(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse> {
    let pending = state
        .connection_service
        .pending_requests_for_giver(&session)
        .await?;
    Ok(Json(pending))
}

#[axum::debug_handler]
pub async fn unread_count(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse> {
    let count = state.connection_service.unread_count_for_giver(&session).await?;
    Ok(Json(UnreadCountResponse { count }))
}

#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<MarkReadPayload>,
) -> Result<impl IntoResponse> {
    let updated = match payload.side {
        ConnectionSide::Giver => {
            state
                .connection_service
                .mark_connections_read_for_giver(&session)
                .await?
        }
        ConnectionSide::Seeker => {
            state
                .connection_service
                .mark_connections_read_for_seeker(&session)
                .await?
        }
    };
    Ok(Json(MarkReadResponse { updated }))
}

#[axum::debug_handler]
pub async fn accept(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    ensure_giver(&state, &session, id).await?;
    state.connection_service.accept_connection(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn reject(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    ensure_giver(&state, &session, id).await?;
    state.connection_service.reject_connection(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Unknown connections pass through so the service keeps its silent no-op.
async fn ensure_giver(state: &AppState, session: &Session, connection_id: Uuid) -> Result<()> {
    let user_id = session.require_user()?;
    match state.connection_service.get_connection(connection_id).await? {
        Some(connection) if connection.giver_id != user_id => Err(Error::Forbidden(
            "only the referral giver can answer this request".to_string(),
        )),
        _ => Ok(()),
    }
}
