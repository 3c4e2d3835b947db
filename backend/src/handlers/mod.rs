pub mod health;
pub mod schedule;
pub mod time;

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::services::SessionError;
use crate::types::SessionId;

/// Decodes a JSON body so malformed payloads share the API's error shape.
pub(crate) fn parse_json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body)
        .map_err(|err| AppError::BadRequest(format!("Invalid request body: {}", err)))
}

/// Like [`parse_json_body`], but an empty body yields `T::default()`.
pub(crate) fn parse_optional_json_body<T>(body: &Bytes) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    parse_json_body(body)
}

/// A path segment that is not a valid session ID cannot name an existing session.
pub(crate) fn parse_session_id(raw: &str) -> Result<SessionId, AppError> {
    raw.parse()
        .map_err(|_| AppError::Session(SessionError::SessionNotFound))
}
