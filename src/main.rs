use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use promptlens::app_state::AppState;
use promptlens::config::AppConfig;
use promptlens::routes;
use promptlens::services::{providers::ProviderSet, registry};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing promptlens server");

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!("validation_jobs_started", "Key validation jobs started");
    metrics::describe_counter!(
        "validation_jobs_succeeded",
        "Key validation jobs that returned a model list"
    );
    metrics::describe_counter!(
        "validation_jobs_failed",
        "Key validation jobs that ended in an error"
    );
    metrics::describe_counter!(
        "validation_jobs_expired",
        "Finished validation jobs evicted from the registry"
    );
    metrics::describe_gauge!(
        "validation_jobs_tracked",
        "Validation jobs currently held in the registry"
    );
    metrics::describe_histogram!(
        "provider_call_seconds",
        "Latency of upstream provider calls"
    );

    tracing::info!(
        openai = %config.openai_base_url,
        google = %config.google_base_url,
        timeout_secs = config.provider_timeout_secs,
        "Initializing provider clients"
    );
    let providers = ProviderSet::from_config(&config).expect("Failed to initialize provider clients");

    let state = AppState::new(&config, providers);

    let sweeper = registry::spawn_expiry_sweeper(
        state.registry.clone(),
        config.job_ttl(),
        config.job_sweep_interval(),
    );

    let app = routes::build_router(state.clone(), prometheus_handle, config.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Shutting down, draining validation jobs");
    sweeper.abort();
    state.validation.shutdown(config.shutdown_grace()).await;
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
