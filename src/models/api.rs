use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::models::job::JobId;

/// Body of `start-validation`, `validate-key` and `check-key`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct KeyRequest {
    #[serde(default)]
    #[garde(length(min = 1))]
    pub api_key: String,

    #[serde(default)]
    #[garde(length(min = 1, max = 64))]
    pub provider: String,
}

/// Response after starting an asynchronous validation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartValidationResponse {
    pub job_id: JobId,
}

/// Query string of `get-validation-status`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub job_id: Option<String>,
}

/// Response of the synchronous model listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}

/// Response of the synchronous boolean key check.
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyCheckResponse {
    pub valid: bool,
}

/// Body of `generate-prompt`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePromptRequest {
    #[serde(default)]
    #[garde(length(min = 1))]
    pub system_prompt: String,

    #[serde(default)]
    #[garde(length(min = 1))]
    pub api_key: String,

    #[serde(default)]
    #[garde(length(min = 1, max = 64))]
    pub provider: String,

    #[serde(default)]
    #[garde(length(min = 1, max = 200), custom(plain_model_name))]
    pub model_name: String,

    #[serde(default)]
    #[garde(length(min = 1))]
    pub image_base64: String,
}

/// Model names end up in upstream URL paths, so only `[A-Za-z0-9._-]` is
/// accepted, optionally behind Google's `models/` prefix.
fn plain_model_name(value: &str, _ctx: &()) -> garde::Result {
    let name = value.strip_prefix("models/").unwrap_or(value);
    let plain = name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'));
    if name.is_empty() || !plain {
        return Err(garde::Error::new("may only contain letters, digits, '.', '_' and '-'"));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeneratePromptResponse {
    pub prompt: String,
}

/// Common error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
