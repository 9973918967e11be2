//! Router assembly: HTTP endpoints, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - REST-ish API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        .route("/api/v1/health", get(http::http_health))
        // Reference data
        .route(
            "/api/v1/barriers",
            get(http::http_list_barriers).post(http::http_create_barrier),
        )
        .route(
            "/api/v1/learning_styles",
            get(http::http_list_learning_styles).post(http::http_create_learning_style),
        )
        .route(
            "/api/v1/students",
            get(http::http_list_students).post(http::http_create_student),
        )
        // Activities + generation
        .route(
            "/api/v1/activities",
            get(http::http_list_activities).post(http::http_create_activity),
        )
        .route("/api/v1/activities/generate", post(http::http_generate_activity))
        // Wizard
        .route("/api/v1/wizard/filter", post(http::http_wizard_filter))
        // Interventions + comments
        .route(
            "/api/v1/interventions",
            get(http::http_list_interventions).post(http::http_create_intervention),
        )
        .route(
            "/api/v1/interventions/:id/comments",
            get(http::http_list_comments).post(http::http_create_comment),
        )
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
