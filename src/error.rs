use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::models::api::ErrorBody;
use crate::services::prompt::PromptError;
use crate::services::providers::ProviderError;
use crate::services::registry::RegistryError;
use crate::services::validation::ValidationError;

/// Errors returned to HTTP clients as `{"error": ..., "details"?: ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest {
        message: String,
        details: Option<String>,
    },

    #[error("Method {0} Not Allowed")]
    MethodNotAllowed(Method),

    #[error("Job not found.")]
    NotFound,

    #[error("Request body too large.")]
    PayloadTooLarge { details: String },

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("{context}")]
    ProviderRejected { context: &'static str, details: String },

    #[error("{context}")]
    Timeout { context: &'static str, details: String },

    #[error("Internal Server Error")]
    Internal { details: String },
}

const VALIDATION_CONTEXT: &str = "Failed to validate API key.";
const PROMPT_CONTEXT: &str = "Failed to generate prompt from AI service.";

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            details: None,
        }
    }

    pub fn invalid(message: impl Into<String>, report: garde::Report) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            details: Some(report.to_string()),
        }
    }

    fn upstream(context: &'static str, err: ProviderError) -> Self {
        match err {
            ProviderError::Timeout(_) => ApiError::Timeout {
                context,
                details: err.to_string(),
            },
            ProviderError::Rejected { .. } => ApiError::ProviderRejected {
                context,
                details: err.to_string(),
            },
            ProviderError::Http(_) | ProviderError::Malformed(_) => ApiError::Internal {
                details: err.to_string(),
            },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } | ApiError::UnsupportedProvider(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ProviderRejected { .. } | ApiError::Timeout { .. } | ApiError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::BadRequest { details, .. } => details.clone(),
            ApiError::ProviderRejected { details, .. }
            | ApiError::Timeout { details, .. }
            | ApiError::Internal { details }
            | ApiError::PayloadTooLarge { details } => Some(details.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, details = ?self.details(), "Request failed");
        }
        let body = ErrorBody {
            error: self.to_string(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // The body limit surfaces as a buffering failure of the JSON extractor.
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge {
                details: rejection.body_text(),
            };
        }
        ApiError::BadRequest {
            message: "Invalid JSON in request body.".to_string(),
            details: Some(rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest {
            message: "Invalid query string.".to_string(),
            details: Some(rejection.body_text()),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(_) => ApiError::NotFound,
            other => ApiError::Internal {
                details: other.to_string(),
            },
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::BadRequest(message) => ApiError::bad_request(message),
            ValidationError::UnsupportedProvider(name) => ApiError::UnsupportedProvider(name),
            ValidationError::Provider(e) => ApiError::upstream(VALIDATION_CONTEXT, e),
            ValidationError::Registry(e) => e.into(),
        }
    }
}

impl From<PromptError> for ApiError {
    fn from(err: PromptError) -> Self {
        match err {
            PromptError::BadRequest(message) => ApiError::bad_request(message),
            PromptError::UnsupportedProvider(name) => ApiError::UnsupportedProvider(name),
            PromptError::Provider(e) => ApiError::upstream(PROMPT_CONTEXT, e),
        }
    }
}

/// Fallback for API routes hit with the wrong HTTP method.
pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}
