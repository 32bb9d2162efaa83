use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::api::{GeneratePromptRequest, GeneratePromptResponse};

/// POST /api/generate-prompt — turn an image into a text prompt.
pub async fn generate_prompt(
    State(state): State<AppState>,
    body: Result<Json<GeneratePromptRequest>, JsonRejection>,
) -> Result<Json<GeneratePromptResponse>, ApiError> {
    let Json(request) = body?;
    request
        .validate()
        .map_err(|report| ApiError::invalid("Missing required parameters.", report))?;

    let prompt = state.prompts.generate(&request).await?;
    Ok(Json(GeneratePromptResponse { prompt }))
}
