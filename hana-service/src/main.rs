use dotenvy::dotenv;
use hana_service::config::HanaConfig;
use hana_service::services::{init_metrics, GoogleVisionClient, ServiceAccountKey};
use hana_service::startup::Application;
use service_core::observability::init_tracing;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = HanaConfig::load().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "hana-service",
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    )?;

    // Must run before any metrics are recorded
    init_metrics()?;

    let key = ServiceAccountKey::from_file(&config.google.credentials_path).map_err(|e| {
        tracing::error!("Failed to load service account credentials: {}", e);
        e
    })?;
    let annotator = Arc::new(GoogleVisionClient::new(config.google.vision(), key)?);

    let app = Application::build(config, annotator).await?;
    app.run_until_stopped().await?;

    tracing::info!("Server stopped");
    Ok(())
}
