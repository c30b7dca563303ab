use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::test_dto::{PassedResponse, SubmitTestPayload},
    error::Result,
    session::Session,
    AppState,
};

#[axum::debug_handler]
pub async fn submit_test(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitTestPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let result = state
        .test_service
        .submit_test(&session, id, payload.answers)
        .await?;
    Ok(Json(result))
}

#[axum::debug_handler]
pub async fn has_passed(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let candidate_id = session.require_user()?;
    let passed = state.test_service.has_passed_test(candidate_id, id).await?;
    Ok(Json(PassedResponse { test_id: id, passed }))
}

#[axum::debug_handler]
pub async fn list_my_attempts(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let candidate_id = session.require_user()?;
    let attempts = state.test_service.list_attempts(candidate_id, id).await?;
    Ok(Json(attempts))
}
