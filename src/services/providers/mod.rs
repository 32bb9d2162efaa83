//! Upstream generative-AI providers.
//!
//! Every provider exposes the same capability set behind [`ModelProvider`]:
//! model listing, a cheap credential check and image-to-text generation.
//! [`ProviderSet`] maps the caller's [`Provider`] choice to an implementation.

pub mod google;
pub mod openai;

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::models::provider::Provider;

/// An image sent to a vision model, already base64-encoded.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub mime_type: &'static str,
    pub base64: String,
}

#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Models usable with this credential, filtered and sorted newest-looking first.
    async fn list_models(&self, api_key: &str) -> Result<Vec<String>, ProviderError>;

    /// One cheap authenticated call; `Ok(())` means the credential was accepted.
    async fn validate_credential(&self, api_key: &str) -> Result<(), ProviderError>;

    /// Ask `model` to describe `image` following `prompt`.
    async fn generate_from_image(
        &self,
        prompt: &str,
        api_key: &str,
        model: &str,
        image: &ImagePayload,
    ) -> Result<String, ProviderError>;

    fn name(&self) -> &str;
}

/// The configured implementation for each [`Provider`].
#[derive(Clone)]
pub struct ProviderSet {
    openai: Arc<dyn ModelProvider>,
    google: Arc<dyn ModelProvider>,
}

impl ProviderSet {
    pub fn new(openai: Arc<dyn ModelProvider>, google: Arc<dyn ModelProvider>) -> Self {
        Self { openai, google }
    }

    /// HTTP clients for the real OpenAI and Google endpoints.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let openai = openai::OpenAiClient::new(&config.openai_base_url, config.openai_max_tokens)?;
        let google = google::GeminiClient::new(&config.google_base_url)?;
        Ok(Self::new(Arc::new(openai), Arc::new(google)))
    }

    pub fn get(&self, provider: Provider) -> &Arc<dyn ModelProvider> {
        match provider {
            Provider::OpenAi => &self.openai,
            Provider::Google => &self.google,
        }
    }
}

/// Keep the identifiers `keep` accepts and order them descending
/// lexicographically, so the highest-looking names come first.
pub(crate) fn sort_descending<I, F>(ids: I, keep: F) -> Vec<String>
where
    I: IntoIterator<Item = String>,
    F: Fn(&str) -> bool,
{
    let mut models: Vec<String> = ids.into_iter().filter(|id| keep(id)).collect();
    models.sort_unstable_by(|a, b| b.cmp(a));
    models
}

/// Run one provider call under `limit`, recording its latency.
pub async fn bounded<T, F>(provider: Provider, limit: Duration, call: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    let start = Instant::now();
    let outcome = tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(ProviderError::Timeout(limit)));
    metrics::histogram!("provider_call_seconds", "provider" => provider.to_string())
        .record(start.elapsed().as_secs_f64());
    outcome
}

/// Shared HTTP client setup for provider clients.
pub(crate) fn http_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .user_agent(concat!("promptlens/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(std::time::Duration::from_secs(5))
        .build()
        .map_err(ProviderError::Http)
}

/// Error body shape shared by OpenAI and Google: `{"error": {"message": ...}}`.
#[derive(serde::Deserialize)]
pub(crate) struct UpstreamErrorBody {
    pub error: Option<UpstreamErrorDetail>,
}

#[derive(serde::Deserialize)]
pub(crate) struct UpstreamErrorDetail {
    pub message: Option<String>,
}

/// Turn a non-2xx response into [`ProviderError::Rejected`], preferring the
/// provider's own message over `fallback`.
pub(crate) async fn rejected(response: reqwest::Response, fallback: &str) -> ProviderError {
    let status = response.status().as_u16();
    let message = response
        .json::<UpstreamErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error)
        .and_then(|detail| detail.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| fallback.to_string());
    ProviderError::Rejected { status, message }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Failed to reach provider: {0}")]
    Http(reqwest::Error),

    #[error("Malformed provider response: {0}")]
    Malformed(String),

    #[error("Provider timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),
}

impl ProviderError {
    /// Whether the provider refused the credential itself.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ProviderError::Rejected { status: 400 | 401 | 403, .. })
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs can carry credentials; keep them out of messages.
        if err.is_decode() {
            ProviderError::Malformed(err.without_url().to_string())
        } else {
            ProviderError::Http(err.without_url())
        }
    }
}
