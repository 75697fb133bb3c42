use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

use auto_specifics::{app_state::AppState, config::AppConfig, routes};

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

    tracing::info!("Initializing auto-specifics server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!("analyze_requests_total", "Total analyze requests received");
    metrics::describe_counter!(
        "analyze_failures_total",
        "Analyze requests that failed, by stage reached and error kind"
    );
    metrics::describe_histogram!(
        "analyze_processing_seconds",
        "Time to run the analyze pipeline for one request"
    );

    let bind_addr = config.bind_addr();

    // Missing or invalid credentials only degrade /analyze
    let state = AppState::from_config(config).expect("Failed to initialize upstream clients");
    if state.labels.is_none() {
        tracing::warn!("Starting without a Vision client; /analyze will report a configuration error");
    }

    let app = routes::router(state, Some(prometheus_handle));

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
