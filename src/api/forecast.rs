use super::latest::load_snapshot;
use super::{query_store, ApiError, ApiState};
use crate::forecast::{cap_history, AssessmentInput, ForecastResult, RiskAssessment};
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Query parameters for forecasting
#[derive(Debug, Default, Deserialize)]
pub struct ForecastParams {
    /// Trailing history window in hours (default from config, 24)
    pub hours: Option<u32>,
}

/// Current conditions for an assessment. Omitted fields come from the latest
/// snapshot; `wetnessRaw` falls back to the soil reading.
#[derive(Debug, Default, Deserialize)]
pub struct AssessRequest {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    #[serde(rename = "wetnessRaw")]
    pub wetness_raw: Option<f64>,
}

/// GET /api/forecast?hours=N
///
/// Returns the JSON payload extracted from the model reply as-is, or the
/// validated forecast when `forecast.strict_schema` is set.
pub(super) async fn get_forecast(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<ForecastParams>,
) -> Result<Response, ApiError> {
    let hours = params
        .hours
        .unwrap_or(state.config.api.default_history_hours);
    if hours == 0 {
        return Err(ApiError::BadRequest("hours must be at least 1".to_string()));
    }

    let history = query_store(&state.store, move |store| store.fetch_history(hours)).await?;
    let history = cap_history(history, state.config.forecast.max_history_rows);

    let payload = state.pipeline.forecast(&history).await?;

    info!(
        hours = hours,
        readings = history.len(),
        model = %state.pipeline.model_name(),
        "Forecast generated"
    );

    if state.config.forecast.strict_schema {
        let result = ForecastResult::from_payload(&payload)?;
        return Ok(Json(result).into_response());
    }

    Ok((
        [(header::CONTENT_TYPE, "application/json")],
        payload.into_inner(),
    )
        .into_response())
}

/// POST /api/assess - Point-in-time black ice risk assessment
pub(super) async fn post_assess(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<AssessRequest>,
) -> Result<Json<RiskAssessment>, ApiError> {
    let input = match (request.temperature, request.humidity, request.wetness_raw) {
        (Some(temperature), Some(humidity), Some(wetness_raw)) => AssessmentInput {
            temperature,
            humidity,
            wetness_raw,
        },
        (temperature, humidity, wetness_raw) => {
            let snapshot = load_snapshot(&state).await?;
            AssessmentInput {
                temperature: temperature.unwrap_or(snapshot.temperature),
                humidity: humidity.unwrap_or(snapshot.humidity),
                wetness_raw: wetness_raw.unwrap_or(snapshot.soil),
            }
        }
    };

    let assessment = state.pipeline.assess(&input).await?;

    info!(risk = ?assessment.risk, "Risk assessment generated");
    Ok(Json(assessment))
}

/// GET /api/models - Models available to the configured key
pub(super) async fn list_models(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let models = state
        .pipeline
        .list_models()
        .await
        .map_err(ApiError::ModelListing)?;
    Ok(Json(models))
}
