use axum::{
    body::Bytes,
    extract::{Extension, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::{parse_json_body, parse_optional_json_body},
    models::{
        session::{
            ManualSessionInput, Session, SessionListFilters, SessionListQuery, StartSessionInput,
            StopSessionInput,
        },
        user::AuthIdentity,
        PaginatedResponse,
    },
    state::AppState,
};

pub async fn start_session(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthIdentity>,
    body: Bytes,
) -> Result<(StatusCode, Json<Session>), AppError> {
    let payload: StartSessionInput = parse_optional_json_body(&body)?;
    payload.validate()?;

    let session = state
        .time_service
        .start_session(&identity.external_id, payload.device_id)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn stop_session(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthIdentity>,
    body: Bytes,
) -> Result<Json<Session>, AppError> {
    let payload: StopSessionInput = parse_json_body(&body)?;
    let session = state
        .time_service
        .stop_session(&identity.external_id, payload.session_id)
        .await?;
    Ok(Json(session))
}

/// Returns the caller's live session, or `null` when there is none.
pub async fn get_active_session(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthIdentity>,
) -> Result<Json<Option<Session>>, AppError> {
    let session = state
        .time_service
        .get_active_session(&identity.external_id)
        .await?;
    Ok(Json(session))
}

pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthIdentity>,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<PaginatedResponse<Session>>, AppError> {
    let filters = SessionListFilters::try_from(query)?;
    let (sessions, total) = state
        .time_service
        .list_sessions(&identity.external_id, &filters)
        .await?;
    Ok(Json(PaginatedResponse::new(
        sessions,
        total,
        filters.page,
        filters.per_page,
    )))
}

pub async fn create_manual_session(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthIdentity>,
    body: Bytes,
) -> Result<(StatusCode, Json<Session>), AppError> {
    let payload: ManualSessionInput = parse_json_body(&body)?;
    payload.validate()?;

    let session = state
        .time_service
        .create_manual_session(
            &identity.external_id,
            &payload.start_time,
            &payload.end_time,
            payload.device_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}
