#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::{
    error::ErrorResponse,
    handlers::{health::HealthResponse, schedule::MessageResponse},
    models::{
        session::{
            ManualSessionInput, ScheduleInput, ScheduleResponse, Session, SessionListQuery,
            SessionStatus, StartSessionInput, StopSessionInput,
        },
        PaginatedResponse,
    },
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_doc,
        ready_doc,
        start_session_doc,
        stop_session_doc,
        active_session_doc,
        list_sessions_doc,
        create_manual_session_doc,
        set_schedule_doc,
        get_schedule_doc,
        cancel_schedule_doc
    ),
    components(
        schemas(
            Session,
            SessionStatus,
            StartSessionInput,
            StopSessionInput,
            ManualSessionInput,
            ScheduleInput,
            ScheduleResponse,
            MessageResponse,
            HealthResponse,
            ErrorResponse
        )
    ),
    modifiers(&SecuritySchemes),
    tags(
        (name = "Time", description = "Live clock-in / clock-out and session history"),
        (name = "Schedule", description = "Auto-stop schedules"),
        (name = "Health", description = "Liveness and readiness probes")
    ),
    security(("BearerAuth" = []))
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();

        let mut bearer = Http::new(HttpAuthScheme::Bearer);
        bearer.bearer_format = Some("JWT".to_string());

        components.add_security_scheme("BearerAuth", SecurityScheme::Http(bearer));
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Database reachable", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    ),
    tag = "Health",
    security(())
)]
fn health_doc() {}

#[utoipa::path(
    get,
    path = "/ready",
    responses((status = 200, body = HealthResponse)),
    tag = "Health",
    security(())
)]
fn ready_doc() {}

#[utoipa::path(
    post,
    path = "/api/v1/time/start",
    request_body(content = StartSessionInput, description = "Optional; an empty body is accepted"),
    responses(
        (status = 201, description = "Session started", body = Session),
        (status = 409, description = "Active session or session for today exists", body = ErrorResponse)
    ),
    tag = "Time"
)]
fn start_session_doc() {}

#[utoipa::path(
    post,
    path = "/api/v1/time/stop",
    request_body = StopSessionInput,
    responses(
        (status = 200, description = "Session completed", body = Session),
        (status = 400, description = "Not active or shorter than 4 hours", body = ErrorResponse),
        (status = 403, description = "Session belongs to another user", body = ErrorResponse),
        (status = 404, description = "Session or user not found", body = ErrorResponse)
    ),
    tag = "Time"
)]
fn stop_session_doc() {}

#[utoipa::path(
    get,
    path = "/api/v1/time/active",
    responses((status = 200, description = "Active session, or null", body = Session)),
    tag = "Time"
)]
fn active_session_doc() {}

#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    params(SessionListQuery),
    responses(
        (status = 200, description = "Sessions, newest first", body = PaginatedResponse<Session>),
        (status = 400, description = "Unknown status filter", body = ErrorResponse)
    ),
    tag = "Time"
)]
fn list_sessions_doc() {}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/manual",
    request_body = ManualSessionInput,
    responses(
        (status = 201, description = "Completed session created", body = Session),
        (status = 400, description = "Invalid range, duration or future end", body = ErrorResponse),
        (status = 409, description = "Session already exists for the date", body = ErrorResponse)
    ),
    tag = "Time"
)]
fn create_manual_session_doc() {}

#[utoipa::path(
    post,
    path = "/api/v1/schedule",
    request_body = ScheduleInput,
    responses(
        (status = 201, description = "Schedule stored", body = Session),
        (status = 400, description = "Scheduled end not in the future", body = ErrorResponse),
        (status = 403, description = "Session belongs to another user", body = ErrorResponse),
        (status = 404, description = "Session or user not found", body = ErrorResponse)
    ),
    tag = "Schedule"
)]
fn set_schedule_doc() {}

#[utoipa::path(
    get,
    path = "/api/v1/schedule/{id}",
    params(("id" = String, Path, description = "Session ID")),
    responses(
        (status = 200, body = ScheduleResponse),
        (status = 404, body = ErrorResponse)
    ),
    tag = "Schedule"
)]
fn get_schedule_doc() {}

#[utoipa::path(
    delete,
    path = "/api/v1/schedule/{id}",
    params(("id" = String, Path, description = "Session ID")),
    responses(
        (status = 200, body = MessageResponse),
        (status = 404, body = ErrorResponse)
    ),
    tag = "Schedule"
)]
fn cancel_schedule_doc() {}
