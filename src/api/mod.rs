// HTTP API: dashboard, latest snapshot, forecast

mod dashboard;
mod error;
mod forecast;
mod latest;

pub use error::{ApiError, ErrorResponse};
pub use forecast::{AssessRequest, ForecastParams};

use crate::config::SensorcastConfig;
use crate::forecast::ForecastPipeline;
use crate::store::{ReadingStore, StoreError};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state. Read-only after startup.
#[derive(Clone)]
pub struct ApiState {
    pub store: ReadingStore,
    pub pipeline: Arc<ForecastPipeline>,
    pub config: Arc<SensorcastConfig>,
}

/// Create API router with all endpoints
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/api/latest", get(latest::get_latest))
        .route("/api/forecast", get(forecast::get_forecast))
        .route("/api/assess", post(forecast::post_assess))
        .route("/api/models", get(forecast::list_models))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Runs a blocking store query off the async runtime.
async fn query_store<T, F>(store: &ReadingStore, query: F) -> Result<T, ApiError>
where
    F: FnOnce(&ReadingStore) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let store = store.clone();
    tokio::task::spawn_blocking(move || query(&store))
        .await
        .map_err(|e| ApiError::Internal(format!("store task failed: {}", e)))?
        .map_err(ApiError::from)
}
