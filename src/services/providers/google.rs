use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{http_client, rejected, sort_descending, ImagePayload, ModelProvider, ProviderError};

const API_KEY_HEADER: &str = "x-goog-api-key";
const NAME_PREFIX: &str = "models/";
const NAME_MARKER: &str = "gemini";
const GENERATE_CONTENT: &str = "generateContent";
const LIST_FALLBACK: &str = "Invalid Google API Key or API is not enabled.";

/// Client for the Google Generative Language REST API.
pub struct GeminiClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiModel {
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<GeminiModel>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(base_url: &str) -> Result<Self, ProviderError> {
        Ok(Self {
            http: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_models(&self, api_key: &str, page_size: &str) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .http
            .get(format!("{}/models", self.base_url))
            .header(API_KEY_HEADER, api_key)
            .query(&[("pageSize", page_size)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejected(response, LIST_FALLBACK).await);
        }
        Ok(response)
    }

    fn model_url(&self, model: &str, action: &str) -> String {
        let model = model.strip_prefix(NAME_PREFIX).unwrap_or(model);
        format!("{}/models/{}:{}", self.base_url, model, action)
    }
}

/// Gemini models that can generate content, without the `models/` prefix,
/// newest-looking first.
pub fn select_gemini_models(models: impl IntoIterator<Item = GeminiModel>) -> Vec<String> {
    let names = models
        .into_iter()
        .filter(|m| m.supported_generation_methods.iter().any(|g| g == GENERATE_CONTENT))
        .map(|m| m.name.strip_prefix(NAME_PREFIX).unwrap_or(&m.name).to_string());
    sort_descending(names, |name| name.contains(NAME_MARKER))
}

#[async_trait]
impl ModelProvider for GeminiClient {
    async fn list_models(&self, api_key: &str) -> Result<Vec<String>, ProviderError> {
        let list: ModelList = self.get_models(api_key, "1000").await?.json().await?;
        Ok(select_gemini_models(list.models))
    }

    /// A one-entry model listing. Works for any key the API accepts,
    /// whichever models Google currently serves.
    async fn validate_credential(&self, api_key: &str) -> Result<(), ProviderError> {
        self.get_models(api_key, "1").await?;
        Ok(())
    }

    async fn generate_from_image(
        &self,
        prompt: &str,
        api_key: &str,
        model: &str,
        image: &ImagePayload,
    ) -> Result<String, ProviderError> {
        let body = json!({
            "contents": [{
                "parts": [
                    { "text": prompt },
                    { "inlineData": { "mimeType": image.mime_type, "data": image.base64 } }
                ]
            }]
        });

        let response = self
            .http
            .post(self.model_url(model, "generateContent"))
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejected(response, "Google rejected the request.").await);
        }

        let generated: GenerateContentResponse = response.json().await?;
        let text: String = generated
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::Malformed("response has no text candidates".into()));
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        "Google"
    }
}
