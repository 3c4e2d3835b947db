use axum::{
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::Config,
    docs::ApiDoc,
    handlers::{health, schedule, time},
    middleware::{auth::auth, rate_limit::user_rate_limit},
    state::AppState,
};

/// Builds the full HTTP surface: public probes, the authenticated `/api/v1`
/// routes and the Swagger UI.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready));

    let user_routes = Router::new()
        .route("/time/start", post(time::start_session))
        .route("/time/stop", post(time::stop_session))
        .route("/time/active", get(time::get_active_session))
        .route("/sessions", get(time::list_sessions))
        .route("/sessions/manual", post(time::create_manual_session))
        .route("/schedule", post(schedule::set_schedule))
        .route(
            "/schedule/{id}",
            get(schedule::get_schedule).delete(schedule::cancel_schedule),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            user_rate_limit,
        ))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), auth));

    let cors = cors_layer(&state.config);

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", user_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(Duration::from_secs(24 * 60 * 60))
}
