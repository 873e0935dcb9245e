pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    http::Request,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use gateway_core::middleware::rate_limit::ip_rate_limit_middleware;
use gateway_core::middleware::request_id::request_id_middleware;
use gateway_core::middleware::security_headers::security_headers_middleware;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{auth_middleware, quota_middleware};
use crate::services::metrics::track_http_metrics;

pub use startup::{AppState, Application};

/// Service health check for liveness probes.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "gateway-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub fn build_router(state: AppState) -> Router {
    // Register and login share an IP rate limit so a single host cannot
    // hammer the credential endpoints.
    let auth_limiter = state.auth_rate_limiter.clone();
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .layer(from_fn_with_state(auth_limiter, ip_rate_limit_middleware));

    // The prompt route runs auth first, then the quota gate, so a denied
    // request is attributed to an authenticated account.
    let prompt_route = Router::new()
        .route("/api/prompt", post(handlers::submit_prompt))
        .layer(from_fn_with_state(state.clone(), quota_middleware))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(handlers::me))
        .route("/api/subscriptions", post(handlers::subscribe))
        .route(
            "/api/subscriptions/current",
            get(handlers::current_subscription).delete(handlers::cancel_subscription),
        )
        .route("/api/payments/:payment_id", get(handlers::get_payment))
        .route("/api/payments/:payment_id/check", post(handlers::check_payment))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route("/api/plans", get(handlers::list_plans))
        .route("/api/models/:provider", get(handlers::list_models))
        .route("/api/payments/webhook", post(handlers::payment_webhook))
        .merge(auth_routes)
        .merge(prompt_route)
        .merge(protected_routes)
        .with_state(state)
        // Add metrics middleware
        .layer(from_fn(track_http_metrics))
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        // Add security headers middleware
        .layer(from_fn(security_headers_middleware))
        // Add CORS layer
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}
