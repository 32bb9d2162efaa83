//! Canned upstream payloads and credentials used by the stub providers.

use serde_json::{json, Value};

pub const OPENAI_VALID_KEY: &str = "sk-test-valid";
pub const OPENAI_SLOW_KEY: &str = "sk-test-slow";
pub const GOOGLE_VALID_KEY: &str = "AIza-test-valid";

pub const OPENAI_REJECTION: &str = "Incorrect API key provided: sk-wr***ng.";
pub const GOOGLE_REJECTION: &str = "API key not valid. Please pass a valid API key.";

/// Still listed by the stub, but every model action on it answers 404.
pub const RETIRED_GOOGLE_MODEL: &str = "gemini-1.5-flash";

pub const GENERATED_PROMPT: &str = "A watercolor fox curled up in fresh snow, soft morning light";

/// Model ids returned by the stub `GET /models`, in upstream order.
pub const OPENAI_MODEL_IDS: &[&str] = &[
    "gpt-4",
    "dall-e-3",
    "gpt-3.5",
    "whisper-1",
    "gpt-4-turbo",
    "text-embedding-3-small",
];

/// What the service should report for [`OPENAI_MODEL_IDS`].
pub const OPENAI_EXPECTED: &[&str] = &["gpt-4-turbo", "gpt-4", "gpt-3.5"];

/// What the service should report for [`google_models`].
pub const GOOGLE_EXPECTED: &[&str] = &["gemini-2.0-flash", "gemini-1.5-pro", "gemini-1.5-flash"];

pub fn openai_models() -> Value {
    let data: Vec<Value> = OPENAI_MODEL_IDS
        .iter()
        .map(|id| json!({ "id": id, "object": "model", "owned_by": "openai" }))
        .collect();
    json!({ "object": "list", "data": data })
}

pub fn google_models() -> Value {
    json!({
        "models": [
            {
                "name": "models/gemini-1.5-flash",
                "supportedGenerationMethods": ["generateContent", "countTokens"]
            },
            {
                "name": "models/embedding-001",
                "supportedGenerationMethods": ["embedContent"]
            },
            {
                "name": "models/gemini-embedding-exp",
                "supportedGenerationMethods": ["embedContent", "countTokens"]
            },
            {
                "name": "models/gemini-2.0-flash",
                "supportedGenerationMethods": ["generateContent"]
            },
            {
                "name": "models/text-bison-001",
                "supportedGenerationMethods": ["generateContent"]
            },
            {
                "name": "models/gemini-1.5-pro",
                "supportedGenerationMethods": ["generateContent", "countTokens"]
            }
        ]
    })
}

/// Smallest PNG signature `image::guess_format` recognises, base64-encoded.
pub fn png_base64() -> String {
    use base64::Engine;
    let header = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
    base64::engine::general_purpose::STANDARD.encode(header)
}
