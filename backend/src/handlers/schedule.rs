use axum::{
    body::Bytes,
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    handlers::{parse_json_body, parse_session_id},
    models::{
        session::{ScheduleInput, ScheduleResponse, Session},
        user::AuthIdentity,
    },
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn set_schedule(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthIdentity>,
    body: Bytes,
) -> Result<(StatusCode, Json<Session>), AppError> {
    let payload: ScheduleInput = parse_json_body(&body)?;
    let session = state
        .schedule_service
        .set_schedule(
            &identity.external_id,
            payload.session_id,
            payload.scheduled_end,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn get_schedule(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthIdentity>,
    Path(id): Path<String>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let session_id = parse_session_id(&id)?;
    let session = state
        .schedule_service
        .get_schedule(&identity.external_id, session_id)
        .await?;
    Ok(Json(ScheduleResponse::from(session)))
}

pub async fn cancel_schedule(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthIdentity>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let session_id = parse_session_id(&id)?;
    state
        .schedule_service
        .cancel_schedule(&identity.external_id, session_id)
        .await?;
    Ok(Json(MessageResponse {
        message: "Schedule cancelled".to_string(),
    }))
}
