use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{http_client, rejected, sort_descending, ImagePayload, ModelProvider, ProviderError};

/// Only chat models are offered to the user.
const MODEL_PREFIX: &str = "gpt";

/// Client for the OpenAI REST API (`/models`, `/chat/completions`).
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(base_url: &str, max_tokens: u32) -> Result<Self, ProviderError> {
        Ok(Self {
            http: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_tokens,
        })
    }

    async fn fetch_model_ids(&self, api_key: &str) -> Result<Vec<String>, ProviderError> {
        let response = self
            .http
            .get(format!("{}/models", self.base_url))
            .bearer_auth(api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejected(response, "OpenAI rejected the request.").await);
        }

        let list: ModelList = response.json().await?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }
}

/// Keep `gpt*` models, newest-looking first.
pub fn select_chat_models(ids: impl IntoIterator<Item = String>) -> Vec<String> {
    sort_descending(ids, |id| id.starts_with(MODEL_PREFIX))
}

#[async_trait]
impl ModelProvider for OpenAiClient {
    async fn list_models(&self, api_key: &str) -> Result<Vec<String>, ProviderError> {
        let ids = self.fetch_model_ids(api_key).await?;
        Ok(select_chat_models(ids))
    }

    async fn validate_credential(&self, api_key: &str) -> Result<(), ProviderError> {
        self.fetch_model_ids(api_key).await.map(|_| ())
    }

    async fn generate_from_image(
        &self,
        prompt: &str,
        api_key: &str,
        model: &str,
        image: &ImagePayload,
    ) -> Result<String, ProviderError> {
        let body = json!({
            "model": model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    {
                        "type": "image_url",
                        "image_url": {
                            "url": format!("data:{};base64,{}", image.mime_type, image.base64)
                        }
                    }
                ]
            }],
            "max_completion_tokens": self.max_tokens
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejected(response, "OpenAI rejected the request.").await);
        }

        let completion: ChatCompletion = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Malformed("completion has no message content".into()))
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}
