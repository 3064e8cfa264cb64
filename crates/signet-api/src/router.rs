//! Route definitions for the Signet HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`. The router
//! receives `AppState` and passes it to all handlers via Axum's `State`
//! extractor.

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use signet_core::config::server::CorsConfig;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let max_body = state.config.server.max_body_bytes;

    let api_routes = Router::new()
        .merge(export_routes())
        .merge(dispatch_routes())
        .merge(signature_routes())
        .merge(admin_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Export job lifecycle: create, poll, download, CSV.
fn export_routes() -> Router<AppState> {
    Router::new()
        .route("/exports", post(handlers::export::create_export))
        .route("/exports/csv", get(handlers::export::export_csv))
        .route("/exports/{job_id}", get(handlers::export::export_status))
        .route(
            "/exports/{job_id}/download",
            get(handlers::export::download_export),
        )
}

/// Bulk dispatch with SSE progress.
fn dispatch_routes() -> Router<AppState> {
    Router::new().route("/dispatch", post(handlers::dispatch::run_dispatch))
}

/// Per-signature endpoints.
fn signature_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/signatures/count",
            get(handlers::signature::signature_count),
        )
        .route(
            "/signatures/{id}/download",
            get(handlers::signature::download_signature),
        )
}

/// Admin-only endpoints.
fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/dispatch-log", get(handlers::admin::dispatch_log))
}

/// Health check endpoint (no auth required).
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// Build CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut cors = CorsLayer::new();

    if config.allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    cors = cors.allow_methods(methods);

    if config.allowed_headers.iter().any(|h| h == "*") {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Vec<HeaderName> = config
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        cors = cors.allow_headers(headers);
    }

    cors.max_age(Duration::from_secs(config.max_age_seconds))
}
