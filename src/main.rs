use anyhow::{Context, Result};
use sensorcast::api::{create_router, ApiState};
use sensorcast::config::SensorcastConfig;
use sensorcast::forecast::{ForecastPipeline, GeminiModel};
use sensorcast::store::ReadingStore;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sensorcast=info".into()),
        )
        .init();

    info!("Sensorcast starting...");

    let config = Arc::new(SensorcastConfig::load().context("Failed to load configuration")?);

    if config.forecast.api_key.is_none() {
        error!("Missing GOOGLE_API_KEY (or GEMINI_API_KEY); forecasts will fail");
    }

    info!(
        store = %config.store.path.display(),
        model = %config.forecast.model,
        horizon_hours = config.forecast.horizon_hours,
        port = config.api.port,
        "Configuration loaded"
    );

    let store = ReadingStore::new(&config.store.path);
    let model = Arc::new(GeminiModel::from_config(&config.forecast));
    let pipeline = Arc::new(ForecastPipeline::new(model, &config.forecast));

    let router = create_router(ApiState {
        store,
        pipeline,
        config: Arc::clone(&config),
    });

    let addr = format!("{}:{}", config.api.bind, config.api.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %addr, "Sensorcast API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server error")?;

    info!("Sensorcast stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler the server runs until killed
        error!(error = %e, "Failed to listen for ctrl_c signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
