use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::models::job::{Job, JobId, JobState};
use crate::models::provider::Provider;
use crate::services::providers::{bounded, ProviderError, ProviderSet};
use crate::services::registry::{JobRegistry, RegistryError};

/// Runs API-key validations against the upstream providers.
///
/// Asynchronous validations are tracked as jobs in the [`JobRegistry`]: `start`
/// records a pending job, hands the provider round trip to a background task
/// and returns the job id straight away. The task performs the job's single
/// terminal write. Every task handle is kept so shutdown can drain or abort
/// the ones still running.
///
/// The synchronous variants (`list_models_now`, `check_key`) call the provider
/// inline under the same timeout.
pub struct ValidationOrchestrator {
    registry: Arc<JobRegistry>,
    providers: ProviderSet,
    timeout: Duration,
    tasks: Mutex<JoinSet<()>>,
}

impl ValidationOrchestrator {
    pub fn new(registry: Arc<JobRegistry>, providers: ProviderSet, timeout: Duration) -> Self {
        Self {
            registry,
            providers,
            timeout,
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// Create a pending job and validate `credential` in the background.
    ///
    /// Only empty inputs are rejected here. Every provider-side failure,
    /// including an unknown provider name, ends up as the job's `error` state.
    pub async fn start(&self, credential: &str, provider_name: &str) -> Result<JobId, ValidationError> {
        if credential.is_empty() || provider_name.is_empty() {
            return Err(ValidationError::BadRequest("Missing apiKey or provider."));
        }

        let id = JobId::new();
        self.registry.create(id, Job::pending(id)).await?;
        metrics::counter!("validation_jobs_started").increment(1);
        info!(job_id = %id, provider = %provider_name, "Validation job started");

        let registry = self.registry.clone();
        let providers = self.providers.clone();
        let timeout = self.timeout;
        let credential = credential.to_string();
        let provider_name = provider_name.to_string();

        let mut tasks = self.tasks.lock().await;
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            let outcome =
                validate_and_get_models(&providers, timeout, &credential, &provider_name).await;
            finish_job(&registry, id, outcome).await;
        });

        Ok(id)
    }

    /// Current record of a job. Pure read.
    pub async fn status(&self, id: JobId) -> Result<Job, RegistryError> {
        self.registry.get(id).await
    }

    /// List the models `credential` can use, waiting for the provider.
    pub async fn list_models_now(
        &self,
        credential: &str,
        provider_name: &str,
    ) -> Result<Vec<String>, ValidationError> {
        validate_and_get_models(&self.providers, self.timeout, credential, provider_name).await
    }

    /// One cheap provider call. `Ok(false)` when the provider refuses the
    /// credential; other failures (network, timeout, outage) are errors.
    pub async fn check_key(&self, credential: &str, provider_name: &str) -> Result<bool, ValidationError> {
        let provider = parse_provider(provider_name)?;
        let client = self.providers.get(provider);
        match bounded(provider, self.timeout, client.validate_credential(credential)).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_auth_failure() => {
                info!(provider = %provider, error = %e, "Provider rejected API key");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Background validations that have not been reaped yet.
    pub async fn in_flight(&self) -> usize {
        let mut tasks = self.tasks.lock().await;
        while tasks.try_join_next().is_some() {}
        tasks.len()
    }

    /// Wait up to `grace` for running validations, then abort the rest.
    pub async fn shutdown(&self, grace: Duration) {
        let mut tasks = self.tasks.lock().await;
        let drained = tokio::time::timeout(grace, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            warn!(remaining = tasks.len(), "Aborting unfinished validation jobs");
            tasks.shutdown().await;
        }
    }
}

/// Fetch and filter the model list for `provider_name`, bounded by `timeout`.
pub async fn validate_and_get_models(
    providers: &ProviderSet,
    timeout: Duration,
    credential: &str,
    provider_name: &str,
) -> Result<Vec<String>, ValidationError> {
    let provider = parse_provider(provider_name)?;
    let client = providers.get(provider);
    tracing::debug!(provider = client.name(), "Listing models");
    let models = bounded(provider, timeout, client.list_models(credential)).await?;
    Ok(models)
}

pub fn parse_provider(name: &str) -> Result<Provider, ValidationError> {
    name.trim()
        .parse()
        .map_err(|_| ValidationError::UnsupportedProvider(name.to_string()))
}

async fn finish_job(
    registry: &JobRegistry,
    id: JobId,
    outcome: Result<Vec<String>, ValidationError>,
) {
    let state = match outcome {
        Ok(models) => {
            metrics::counter!("validation_jobs_succeeded").increment(1);
            info!(job_id = %id, models = models.len(), "Validation job succeeded");
            JobState::Success { models }
        }
        Err(e) => {
            metrics::counter!("validation_jobs_failed").increment(1);
            warn!(job_id = %id, error = %e, "Validation job failed");
            JobState::Error { message: e.to_string() }
        }
    };

    if let Err(e) = registry.complete(id, state).await {
        warn!(job_id = %id, error = %e, "Could not record validation result");
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
