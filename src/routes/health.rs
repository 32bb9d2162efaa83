use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub jobs: JobsHealth,
}

#[derive(Serialize)]
pub struct JobsHealth {
    pub tracked: usize,
    pub in_flight: usize,
}

/// GET /health — liveness plus job registry occupancy.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            jobs: JobsHealth {
                tracked: state.registry.len().await,
                in_flight: state.validation.in_flight().await,
            },
        },
    })
}
