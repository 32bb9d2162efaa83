use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000")
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// OpenAI REST API base URL
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    /// Google Generative Language REST API base URL
    #[serde(default = "default_google_base_url")]
    pub google_base_url: String,

    /// Upper bound for a single provider call, in seconds
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// How long a finished validation job stays pollable, in seconds
    #[serde(default = "default_job_ttl_secs")]
    pub job_ttl_secs: u64,

    /// Interval between expiry sweeps of the job registry, in seconds
    #[serde(default = "default_job_sweep_interval_secs")]
    pub job_sweep_interval_secs: u64,

    /// Maximum accepted request body (base64 images are large)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// `max_completion_tokens` sent with OpenAI vision completions
    #[serde(default = "default_openai_max_tokens")]
    pub openai_max_tokens: u32,

    /// Time allowed for outstanding validation tasks on shutdown, in seconds
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_google_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_provider_timeout_secs() -> u64 {
    8
}

fn default_job_ttl_secs() -> u64 {
    900
}

fn default_job_sweep_interval_secs() -> u64 {
    60
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_openai_max_tokens() -> u32 {
    300
}

fn default_shutdown_grace_secs() -> u64 {
    5
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn job_ttl(&self) -> Duration {
        Duration::from_secs(self.job_ttl_secs)
    }

    pub fn job_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.job_sweep_interval_secs.max(1))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            openai_base_url: default_openai_base_url(),
            google_base_url: default_google_base_url(),
            provider_timeout_secs: default_provider_timeout_secs(),
            job_ttl_secs: default_job_ttl_secs(),
            job_sweep_interval_secs: default_job_sweep_interval_secs(),
            max_body_bytes: default_max_body_bytes(),
            openai_max_tokens: default_openai_max_tokens(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}
