use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::referral_dto::{
        ApplicantResponse, CreateReferralPayload, CreateReferralResponse, ScreeningTestView,
    },
    error::{Error, Result},
    session::Session,
    AppState,
};

#[axum::debug_handler]
pub async fn list_referrals(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let referrals = state.referral_service.list_referrals().await?;
    Ok(Json(referrals))
}

#[axum::debug_handler]
pub async fn list_my_referrals(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse> {
    let referrals = state.referral_service.list_referrals_by_poster(&session).await?;
    Ok(Json(referrals))
}

/// Creates the referral and tries to generate its screening test. A failed
/// generation still answers 201, reporting the error next to the referral.
#[axum::debug_handler]
pub async fn create_referral(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateReferralPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let referral = state
        .referral_service
        .create_referral(&session, payload.into())
        .await?;

    let (screening_test, generation_error) =
        match state.referral_service.generate_screening_test(&referral).await {
            Ok(test) => (Some(ScreeningTestView::from(test)), None),
            Err(Error::Generation(e)) => (None, Some(e.to_string())),
            Err(e) => return Err(e),
        };

    Ok((
        StatusCode::CREATED,
        Json(CreateReferralResponse {
            referral,
            screening_test,
            generation_error,
        }),
    ))
}

#[axum::debug_handler]
pub async fn get_referral(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let referral = state.referral_service.get_referral(id).await?;
    Ok(Json(referral))
}

#[axum::debug_handler]
pub async fn delete_referral(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.referral_service.delete_referral(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn get_screening_test(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let test = state.referral_service.get_screening_test(id).await?;
    Ok(Json(ScreeningTestView::from(test)))
}

/// Generates a test for a referral that has none; the poster's retry path.
#[axum::debug_handler]
pub async fn ensure_screening_test(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user_id = session.require_user()?;
    let referral = state.referral_service.get_referral(id).await?;
    if referral.posted_by_user_id != user_id {
        return Err(Error::Forbidden("only the poster can generate a test".to_string()));
    }

    let (test, created) = state.referral_service.ensure_screening_test(id).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(ScreeningTestView::from(test))))
}

#[axum::debug_handler]
pub async fn list_applicants(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user_id = session.require_user()?;
    let referral = state.referral_service.get_referral(id).await?;
    if referral.posted_by_user_id != user_id {
        return Err(Error::Forbidden("only the poster can view applicants".to_string()));
    }

    let connections = state.connection_service.applicants_for_referral(id).await?;
    let mut applicants = Vec::with_capacity(connections.len());
    for connection in connections {
        let test_result = state
            .test_service
            .applicant_test_result(connection.requester_id, id)
            .await?;
        applicants.push(ApplicantResponse {
            connection,
            test_result,
        });
    }
    Ok(Json(applicants))
}

#[axum::debug_handler]
pub async fn request_connection(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let connection = state
        .connection_service
        .request_connection(&session, id)
        .await?;
    Ok((StatusCode::CREATED, Json(connection)))
}
