use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::auth_dto::{AuthResponse, LoginPayload, SignupPayload},
    error::Result,
    utils::token::issue_token,
    AppState,
};

#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state
        .user_service
        .signup(&payload.name, &payload.email, &payload.password, payload.role)
        .await?;
    let token = issue_token(user.id, user.role, &state.jwt_secret, state.jwt_ttl_hours)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state
        .user_service
        .login(&payload.email, &payload.password, payload.role)
        .await?;
    let token = issue_token(user.id, user.role, &state.jwt_secret, state.jwt_ttl_hours)?;
    Ok(Json(AuthResponse { token, user }))
}
