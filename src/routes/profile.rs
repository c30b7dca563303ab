use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::profile_dto::UpdateProfilePayload,
    error::{Error, Result},
    session::Session,
    AppState,
};

#[axum::debug_handler]
pub async fn get_my_profile(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse> {
    let user_id = session.require_user()?;
    let user = state
        .user_service
        .get_user_with_profile(user_id)
        .await?
        .ok_or(Error::NotAuthenticated)?;
    Ok(Json(user))
}

#[axum::debug_handler]
pub async fn update_my_profile(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let profile = state
        .user_service
        .update_profile(&session, payload.into())
        .await?;
    Ok(Json(profile))
}

#[axum::debug_handler]
pub async fn get_user_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user = state
        .user_service
        .get_user_with_profile(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {} not found", id)))?;
    Ok(Json(user))
}
