//! Test helpers: a stub OpenAI/Google upstream and an in-process app server.

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::sleep;

use promptlens::app_state::AppState;
use promptlens::config::AppConfig;
use promptlens::models::job::JobId;
use promptlens::routes;
use promptlens::services::providers::ProviderSet;

use crate::fixtures::*;

/// A running promptlens instance.
pub struct TestApp {
    pub base_url: String,
    pub state: AppState,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Test server error");
    });
    format!("http://{}", addr)
}

/// Start the app against the real HTTP provider clients pointed at `upstream`.
pub async fn spawn_app_with_upstream(upstream: &str, provider_timeout_secs: u64) -> TestApp {
    spawn_app_with_config(upstream_config(upstream, provider_timeout_secs)).await
}

/// Default configuration with both providers pointed at `upstream`.
pub fn upstream_config(upstream: &str, provider_timeout_secs: u64) -> AppConfig {
    AppConfig {
        openai_base_url: format!("{}/openai/v1", upstream),
        google_base_url: format!("{}/google/v1beta", upstream),
        provider_timeout_secs,
        ..AppConfig::default()
    }
}

pub async fn spawn_app_with_config(config: AppConfig) -> TestApp {
    let providers = ProviderSet::from_config(&config).expect("Failed to build providers");
    spawn_app(&config, providers).await
}

/// Start the app with arbitrary providers.
pub async fn spawn_app(config: &AppConfig, providers: ProviderSet) -> TestApp {
    let state = AppState::new(config, providers);
    let prometheus = Arc::new(PrometheusBuilder::new().build_recorder().handle());
    let router = routes::build_router(state.clone(), prometheus, config.max_body_bytes);

    TestApp {
        base_url: serve(router).await,
        state,
        client: reqwest::Client::new(),
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn google_key(headers: &HeaderMap) -> Option<&str> {
    headers.get("x-goog-api-key").and_then(|v| v.to_str().ok())
}

fn error_body(message: &str) -> Json<Value> {
    Json(json!({ "error": { "message": message } }))
}

async fn openai_list_models(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    match bearer(&headers) {
        Some(OPENAI_VALID_KEY) => (StatusCode::OK, Json(openai_models())),
        Some(OPENAI_SLOW_KEY) => {
            sleep(Duration::from_secs(5)).await;
            (StatusCode::OK, Json(openai_models()))
        }
        _ => (StatusCode::UNAUTHORIZED, error_body(OPENAI_REJECTION)),
    }
}

async fn openai_chat(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if bearer(&headers) != Some(OPENAI_VALID_KEY) {
        return (StatusCode::UNAUTHORIZED, error_body(OPENAI_REJECTION));
    }
    // Current chat models refuse the legacy `max_tokens` field.
    if body.get("max_tokens").is_some() || !body["max_completion_tokens"].is_u64() {
        return (StatusCode::BAD_REQUEST, error_body("use max_completion_tokens"));
    }
    let url = body["messages"][0]["content"][1]["image_url"]["url"]
        .as_str()
        .unwrap_or_default();
    if !url.starts_with("data:image/png;base64,") {
        return (StatusCode::BAD_REQUEST, error_body("expected a PNG data URL"));
    }
    (
        StatusCode::OK,
        Json(json!({
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": GENERATED_PROMPT } }]
        })),
    )
}

async fn google_list_models(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if google_key(&headers) != Some(GOOGLE_VALID_KEY) {
        return (StatusCode::BAD_REQUEST, error_body(GOOGLE_REJECTION));
    }
    let mut listing = google_models();
    if let Some(size) = params.get("pageSize").and_then(|s| s.parse::<usize>().ok()) {
        if let Some(models) = listing["models"].as_array_mut() {
            models.truncate(size);
        }
    }
    (StatusCode::OK, Json(listing))
}

async fn google_model_action(
    headers: HeaderMap,
    Path(action): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if google_key(&headers) != Some(GOOGLE_VALID_KEY) {
        return (StatusCode::BAD_REQUEST, error_body(GOOGLE_REJECTION));
    }
    if action.starts_with(RETIRED_GOOGLE_MODEL) {
        let message = format!("models/{RETIRED_GOOGLE_MODEL} is not found for API version v1beta");
        return (StatusCode::NOT_FOUND, error_body(&message));
    }
    if action.ends_with(":generateContent") {
        if body["contents"][0]["parts"][1]["inlineData"]["mimeType"] != "image/png" {
            return (StatusCode::BAD_REQUEST, error_body("expected inline PNG data"));
        }
        return (
            StatusCode::OK,
            Json(json!({
                "candidates": [{ "content": { "role": "model", "parts": [{ "text": GENERATED_PROMPT }] } }]
            })),
        );
    }
    (StatusCode::NOT_FOUND, error_body("unknown method"))
}

/// Start a stub speaking just enough of the OpenAI and Google REST APIs.
pub async fn spawn_stub_upstream() -> String {
    let router = Router::new()
        .route("/openai/v1/models", get(openai_list_models))
        .route("/openai/v1/chat/completions", post(openai_chat))
        .route("/google/v1beta/models", get(google_list_models))
        .route("/google/v1beta/models/{action}", post(google_model_action));
    serve(router).await
}

/// POST /api/start-validation and return the job id.
pub async fn start_validation(
    app: &TestApp,
    api_key: &str,
    provider: &str,
) -> Result<JobId, Box<dyn std::error::Error>> {
    let response = app
        .client
        .post(app.url("/api/start-validation"))
        .json(&json!({ "apiKey": api_key, "provider": provider }))
        .send()
        .await?;

    if response.status() != StatusCode::ACCEPTED {
        let status = response.status();
        let error_text = response.text().await?;
        return Err(format!("Start failed with status {}: {}", status, error_text).into());
    }

    let body: Value = response.json().await?;
    let job_id = body["jobId"].as_str().ok_or("No jobId in response")?;
    Ok(job_id.parse()?)
}

/// Poll job status until it is terminal (with timeout).
pub async fn poll_job_status(
    app: &TestApp,
    job_id: JobId,
    timeout_secs: u64,
) -> Result<Value, Box<dyn std::error::Error>> {
    let max_attempts = timeout_secs * 20; // Poll every 50ms

    for _ in 0..max_attempts {
        let response = app
            .client
            .get(app.url("/api/get-validation-status"))
            .query(&[("jobId", job_id.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(format!("Status check failed: {}", error_text).into());
        }

        let job: Value = response.json().await?;
        match job["status"].as_str() {
            Some("success") | Some("error") => return Ok(job),
            Some("pending") => sleep(Duration::from_millis(50)).await,
            other => return Err(format!("Unknown job status: {:?}", other).into()),
        }
    }

    Err(format!("Job did not complete within {} seconds", timeout_secs).into())
}
