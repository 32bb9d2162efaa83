use base64::Engine;
use image::ImageFormat;
use std::time::Duration;

use crate::models::api::GeneratePromptRequest;
use crate::models::provider::Provider;
use crate::services::providers::{bounded, ImagePayload, ProviderError, ProviderSet};

/// Image-to-prompt generation through the caller-selected provider.
pub struct PromptService {
    providers: ProviderSet,
    timeout: Duration,
}

impl PromptService {
    pub fn new(providers: ProviderSet, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    /// Describe the request's image with its system prompt and model.
    ///
    /// The provider comes from the request's explicit `provider` field; the
    /// model name is passed through untouched.
    pub async fn generate(&self, request: &GeneratePromptRequest) -> Result<String, PromptError> {
        let provider: Provider = request
            .provider
            .trim()
            .parse()
            .map_err(|_| PromptError::UnsupportedProvider(request.provider.clone()))?;
        let image = prepare_image(&request.image_base64)?;

        tracing::info!(
            provider = %provider,
            model = %request.model_name,
            mime_type = image.mime_type,
            "Generating prompt from image"
        );

        let client = self.providers.get(provider);
        let prompt = bounded(
            provider,
            self.timeout,
            client.generate_from_image(&request.system_prompt, &request.api_key, &request.model_name, &image),
        )
        .await?;
        Ok(prompt)
    }
}

/// Validate the base64 image and detect its MIME type from the decoded bytes.
///
/// Accepts either bare base64 or a `data:<mime>;base64,` URL.
pub fn prepare_image(encoded: &str) -> Result<ImagePayload, PromptError> {
    let encoded = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };
    let encoded = encoded.trim();

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| PromptError::BadRequest("imageBase64 is not valid base64."))?;

    let mime_type = match image::guess_format(&bytes) {
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::WebP) => "image/webp",
        _ => return Err(PromptError::BadRequest("Unsupported image format; use JPEG, PNG or WebP.")),
    };

    Ok(ImagePayload {
        mime_type,
        base64: encoded.to_string(),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}
