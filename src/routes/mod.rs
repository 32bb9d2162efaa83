pub mod health;
pub mod metrics;
pub mod prompt;
pub mod validation;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::error::method_not_allowed;

/// Build the HTTP router with all API routes and middleware.
pub fn build_router(state: AppState, prometheus: Arc<PrometheusHandle>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/start-validation",
            post(validation::start_validation).fallback(method_not_allowed),
        )
        .route(
            "/api/get-validation-status",
            get(validation::get_validation_status).fallback(method_not_allowed),
        )
        .route(
            "/api/validate-key",
            post(validation::validate_key).fallback(method_not_allowed),
        )
        .route(
            "/api/check-key",
            post(validation::check_key).fallback(method_not_allowed),
        )
        .route(
            "/api/generate-prompt",
            post(prompt::generate_prompt).fallback(method_not_allowed),
        )
        .with_state(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(metrics::prometheus_metrics).with_state(prometheus),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        // Oversize bodies fail inside the JSON extractors, which answer 413 as `ApiError`.
        .layer(DefaultBodyLimit::max(max_body_bytes))
}
