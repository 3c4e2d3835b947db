use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{
    error::AppError,
    models::user::AuthIdentity,
    state::AppState,
    utils::jwt::{verify_access_token, Claims},
};

/// Verifies the bearer token and injects the caller's [`AuthIdentity`] and
/// [`Claims`] into the request extensions.
pub async fn auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate_request(request.headers(), &state.config.jwt_secret)?;

    request.extensions_mut().insert(AuthIdentity {
        external_id: claims.sub.clone(),
    });
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

fn parse_bearer_token(header: &str) -> Option<&str> {
    let (scheme, rest) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    (!token.is_empty()).then_some(token)
}

fn authenticate_request(headers: &HeaderMap, secret: &str) -> Result<Claims, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer_token)
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".into()))?;

    verify_access_token(token, secret).map_err(|err| {
        tracing::debug!(error = %err, "Rejected bearer token");
        AppError::Unauthorized("Invalid or expired token".into())
    })
}
