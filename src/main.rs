use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use renova_funnel::app_state::AppState;
use renova_funnel::config::AppConfig;
use renova_funnel::routes;
use renova_funnel::services::generation::GenerationClient;
use renova_funnel::services::leads::LeadStoreClient;
use renova_funnel::services::poller::PollPolicy;
use renova_funnel::services::prompt::{ModelParams, PromptTemplate};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing renova-funnel server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_counter!("generation_jobs_total", "Total generation jobs submitted");
    metrics::describe_counter!(
        "generation_jobs_succeeded",
        "Generation jobs that produced a usable output"
    );
    metrics::describe_counter!(
        "generation_jobs_failed",
        "Generation jobs that ended in failure"
    );
    metrics::describe_counter!(
        "generation_jobs_timed_out",
        "Generation jobs stopped by the deadline watchdog"
    );
    metrics::describe_histogram!(
        "generation_duration_seconds",
        "Time from job creation to a successful result"
    );
    metrics::describe_counter!("leads_captured_total", "Leads forwarded to the record store");
    metrics::describe_counter!(
        "lead_submissions_failed_total",
        "Lead submissions the record store did not accept"
    );

    // Initialize the generation API client
    tracing::info!("Initializing generation API client");
    let mut params = ModelParams::default();
    if let Some(version) = config.model_version.clone() {
        params.version = version;
    }
    let prompt = config
        .prompt_template
        .clone()
        .map(PromptTemplate::new)
        .unwrap_or_default();
    let generation = GenerationClient::new(
        &config.generation_api_base,
        &config.generation_api_token,
        params,
        prompt,
    );

    // Initialize the record-store client for lead capture
    tracing::info!("Initializing record-store client");
    let leads = LeadStoreClient::new(
        &config.lead_store_url,
        &config.lead_collection,
        Duration::from_secs(config.lead_timeout_secs),
    );

    let poll_policy = PollPolicy {
        deadline: Duration::from_secs(config.generation_deadline_secs),
        ..Default::default()
    };

    // Create shared application state
    let state = AppState::new(generation, leads, poll_policy);

    // Build API routes
    let app = routes::router(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024)); // 10 MB data-URL uploads

    tracing::info!("Starting renova-funnel on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
