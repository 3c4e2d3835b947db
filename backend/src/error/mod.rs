use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::session::UnknownSessionStatus;
use crate::services::errors::SessionError;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}

#[derive(Debug)]
pub enum AppError {
    Unauthorized(String),
    BadRequest(String),
    TooManyRequests { retry_after: u64 },
    InternalServerError(anyhow::Error),
    Validation(Vec<String>),
    Session(SessionError),
}

fn session_status(err: &SessionError) -> StatusCode {
    match err {
        SessionError::SessionNotFound | SessionError::UserNotFound => StatusCode::NOT_FOUND,
        SessionError::Unauthorized => StatusCode::FORBIDDEN,
        SessionError::SessionAlreadyActive | SessionError::SessionExistsForDate => {
            StatusCode::CONFLICT
        }
        SessionError::NoActiveSession
        | SessionError::InvalidTimeRange
        | SessionError::SessionTooShort
        | SessionError::SessionTooLong
        | SessionError::FutureEndTime
        | SessionError::InvalidScheduleTime => StatusCode::BAD_REQUEST,
        SessionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut retry_after_header = None;
        let (status, error_message, code, details) = match self {
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                msg,
                "UNAUTHORIZED".to_string(),
                None,
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                msg,
                "BAD_REQUEST".to_string(),
                None,
            ),
            AppError::TooManyRequests { retry_after } => {
                retry_after_header = Some(retry_after);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "Too many requests".to_string(),
                    "RATE_LIMIT_EXCEEDED".to_string(),
                    Some(serde_json::json!({ "retry_after": retry_after })),
                )
            }
            AppError::InternalServerError(err) => {
                tracing::error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_SERVER_ERROR".to_string(),
                    None,
                )
            }
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                "VALIDATION_ERROR".to_string(),
                Some(serde_json::json!({ "errors": errors })),
            ),
            AppError::Session(SessionError::Internal(err)) => {
                return AppError::InternalServerError(err).into_response();
            }
            AppError::Session(err) => (
                session_status(&err),
                err.to_string(),
                err.code().to_string(),
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            code,
            details,
        });

        let mut response = (status, body).into_response();
        if let Some(seconds) = retry_after_header {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalServerError(err)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session(err)
    }
}

impl From<UnknownSessionStatus> for AppError {
    fn from(err: UnknownSessionStatus) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let code = e.code.as_ref();
                    format!("{}: {}", field, code)
                })
            })
            .collect();
        AppError::Validation(messages)
    }
}
