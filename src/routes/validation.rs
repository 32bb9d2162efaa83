use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::api::{KeyCheckResponse, KeyRequest, ModelsResponse, StartValidationResponse, StatusQuery};
use crate::models::job::{Job, JobId};

const MISSING_KEY_FIELDS: &str = "Missing apiKey or provider.";

fn key_request(body: Result<Json<KeyRequest>, JsonRejection>) -> Result<KeyRequest, ApiError> {
    let Json(request) = body?;
    request
        .validate()
        .map_err(|report| ApiError::invalid(MISSING_KEY_FIELDS, report))?;
    Ok(request)
}

/// POST /api/start-validation — start validating a key in the background.
pub async fn start_validation(
    State(state): State<AppState>,
    body: Result<Json<KeyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StartValidationResponse>), ApiError> {
    let request = key_request(body)?;
    let job_id = state.validation.start(&request.api_key, &request.provider).await?;
    Ok((StatusCode::ACCEPTED, Json(StartValidationResponse { job_id })))
}

/// GET /api/get-validation-status?jobId= — poll a validation job.
pub async fn get_validation_status(
    State(state): State<AppState>,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> Result<Json<Job>, ApiError> {
    let Query(query) = query?;
    let raw = query
        .job_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing jobId parameter."))?;
    // A malformed id can never have been issued.
    let job_id: JobId = raw.parse().map_err(|_| ApiError::NotFound)?;
    let job = state.validation.status(job_id).await?;
    Ok(Json(job))
}

/// POST /api/validate-key — validate a key and list its models synchronously.
pub async fn validate_key(
    State(state): State<AppState>,
    body: Result<Json<KeyRequest>, JsonRejection>,
) -> Result<Json<ModelsResponse>, ApiError> {
    let request = key_request(body)?;
    let models = state
        .validation
        .list_models_now(&request.api_key, &request.provider)
        .await?;
    Ok(Json(ModelsResponse { models }))
}

/// POST /api/check-key — cheap yes/no key check.
pub async fn check_key(
    State(state): State<AppState>,
    body: Result<Json<KeyRequest>, JsonRejection>,
) -> Result<Json<KeyCheckResponse>, ApiError> {
    let request = key_request(body)?;
    let valid = state
        .validation
        .check_key(&request.api_key, &request.provider)
        .await?;
    Ok(Json(KeyCheckResponse { valid }))
}
