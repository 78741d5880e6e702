use crate::forecast::ForecastError;
use crate::reading::ReadingError;
use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

/// API error types
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Store(StoreError),
    Reading(ReadingError),
    Forecast(ForecastError),
    ModelListing(ForecastError),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Invalid request", msg),
            ApiError::Store(e) => {
                warn!(error = %e, "Reading store query failed");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Reading store unavailable",
                    e.to_string(),
                )
            }
            ApiError::Reading(e) => {
                warn!(error = %e, "Stored reading could not be interpreted");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Malformed reading",
                    e.to_string(),
                )
            }
            ApiError::Forecast(e) => {
                error!(error = %e, "Forecast failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Prediction failed",
                    e.to_string(),
                )
            }
            ApiError::ModelListing(e) => {
                error!(error = %e, "Model listing failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "listModels failed",
                    e.to_string(),
                )
            }
            ApiError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error", msg)
            }
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

impl From<ReadingError> for ApiError {
    fn from(e: ReadingError) -> Self {
        ApiError::Reading(e)
    }
}

impl From<ForecastError> for ApiError {
    fn from(e: ForecastError) -> Self {
        ApiError::Forecast(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> ErrorResponse {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_forecast_error_response() {
        let response =
            ApiError::from(ForecastError::Unavailable("non-JSON response".to_string()))
                .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(response).await;
        assert_eq!(body.error, "Prediction failed");
        assert_eq!(body.details, "forecast unavailable: non-JSON response");
    }

    #[tokio::test]
    async fn test_store_error_response() {
        let response = ApiError::from(StoreError::Unavailable {
            path: "sensor_data.db".to_string(),
            reason: "unable to open database file".to_string(),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_of(response).await;
        assert_eq!(body.error, "Reading store unavailable");
        assert!(body.details.contains("sensor_data.db"));
    }

    #[tokio::test]
    async fn test_reading_error_response() {
        let response =
            ApiError::from(ReadingError::MalformedTimestamp("yesterday".to_string()))
                .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await.error, "Malformed reading");
    }

    #[tokio::test]
    async fn test_bad_request_response() {
        let response = ApiError::BadRequest("hours must be at least 1".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
