use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::models::job::{Job, JobId, JobState};

/// In-memory store of validation jobs, shared by the HTTP handlers and the
/// background validation tasks.
///
/// Records are always replaced whole, so a concurrent reader sees either the
/// pending record or the terminal one, never a mix.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new job. Fails if the id is already taken.
    pub async fn create(&self, id: JobId, job: Job) -> Result<(), RegistryError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }
        jobs.insert(id, job);
        metrics::gauge!("validation_jobs_tracked").set(jobs.len() as f64);
        Ok(())
    }

    /// Overwrite the record at `id`, inserting it if absent.
    pub async fn set(&self, id: JobId, job: Job) {
        let mut jobs = self.jobs.write().await;
        jobs.insert(id, job);
        metrics::gauge!("validation_jobs_tracked").set(jobs.len() as f64);
    }

    /// Current record for `id`.
    pub async fn get(&self, id: JobId) -> Result<Job, RegistryError> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(RegistryError::NotFound(id))
    }

    /// Move a pending job to its terminal state.
    ///
    /// A job that is already terminal is left untouched.
    pub async fn complete(&self, id: JobId, state: JobState) -> Result<Job, RegistryError> {
        let mut jobs = self.jobs.write().await;
        let current = jobs.get(&id).ok_or(RegistryError::NotFound(id))?;
        if current.is_terminal() {
            return Err(RegistryError::AlreadyTerminal(id));
        }
        let finished = current.finish(state);
        jobs.insert(id, finished.clone());
        Ok(finished)
    }

    /// Drop terminal jobs that completed more than `ttl` before `now`.
    /// Pending jobs are never evicted. Returns the number removed.
    pub async fn evict_expired(&self, ttl: Duration, now: DateTime<Utc>) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| match job.completed_at {
            // Completion stamps later than `now` have negative age and stay.
            Some(done) => now
                .signed_duration_since(done)
                .to_std()
                .map_or(true, |age| age <= ttl),
            None => true,
        });
        let removed = before - jobs.len();
        metrics::gauge!("validation_jobs_tracked").set(jobs.len() as f64);
        removed
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

/// Periodically evict expired jobs until the returned handle is aborted.
pub fn spawn_expiry_sweeper(
    registry: Arc<JobRegistry>,
    ttl: Duration,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = registry.evict_expired(ttl, Utc::now()).await;
            if removed > 0 {
                metrics::counter!("validation_jobs_expired").increment(removed as u64);
                tracing::debug!(removed, "Evicted expired validation jobs");
            }
        }
    })
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RegistryError {
    #[error("Job {0} already exists")]
    DuplicateId(JobId),

    #[error("Job {0} not found")]
    NotFound(JobId),

    #[error("Job {0} has already completed")]
    AlreadyTerminal(JobId),
}
