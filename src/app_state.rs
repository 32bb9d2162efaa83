use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{
    prompt::PromptService, providers::ProviderSet, registry::JobRegistry,
    validation::ValidationOrchestrator,
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<JobRegistry>,
    pub validation: Arc<ValidationOrchestrator>,
    pub prompts: Arc<PromptService>,
}

impl AppState {
    pub fn new(config: &AppConfig, providers: ProviderSet) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let validation =
            ValidationOrchestrator::new(registry.clone(), providers.clone(), config.provider_timeout());
        let prompts = PromptService::new(providers, config.provider_timeout());

        Self {
            registry,
            validation: Arc::new(validation),
            prompts: Arc::new(prompts),
        }
    }
}
