//! Short-horizon forecasting through an external text model.
//!
//! # Flow
//!
//! ```text
//! history window ──► prompt ──► ForecastModel::generate ──► raw text
//!                                                              │
//!                         ForecastPayload ◄── extract_json_payload
//!                               │
//!                               ▼ (optional, separate step)
//!                   ForecastResult::from_payload
//! ```
//!
//! The model reply is untrusted. Extraction only guarantees the payload is
//! delimited by the outermost braces; schema validation is a second step.

use crate::config::ForecastConfig;
use crate::reading::Reading;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

mod assessment;
mod extract;
mod gemini;
mod prompt;

pub use assessment::{AssessmentInput, RiskAssessment};
pub use extract::extract_json_payload;
pub use gemini::{GeminiModel, DEFAULT_BASE_URL as GEMINI_BASE_URL};
pub use prompt::{build_assessment_prompt, build_forecast_prompt};

/// Forecast pipeline errors. All of them surface as "forecast unavailable".
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Model unreachable, failed, timed out, or replied without JSON
    Unavailable(String),
    /// Extracted payload does not match the expected shape
    InvalidPayload(String),
}

impl fmt::Display for ForecastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastError::Unavailable(reason) => write!(f, "forecast unavailable: {}", reason),
            ForecastError::InvalidPayload(reason) => {
                write!(f, "forecast payload invalid: {}", reason)
            }
        }
    }
}

impl std::error::Error for ForecastError {}

/// External text-in/text-out model.
#[async_trait]
pub trait ForecastModel: Send + Sync {
    /// Generate a completion for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String, ForecastError>;
    /// Model names available to the configured credential.
    async fn list_models(&self) -> Result<Vec<String>, ForecastError>;
    /// Human-readable model name (e.g. "gemini-2.5-flash").
    fn name(&self) -> &str;
}

/// Risk level reported by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// One forecast step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Offset label, e.g. "+1h"
    pub hour: String,
    pub temperature: f64,
    pub humidity: f64,
    pub risk: RiskLevel,
}

/// Validated forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub forecast: Vec<ForecastPoint>,
    pub summary: String,
}

impl ForecastResult {
    /// Validates an extracted payload against the forecast shape.
    pub fn from_payload(payload: &ForecastPayload) -> Result<Self, ForecastError> {
        let result: ForecastResult = serde_json::from_str(payload.as_str())
            .map_err(|e| ForecastError::InvalidPayload(e.to_string()))?;

        if result.forecast.is_empty() {
            return Err(ForecastError::InvalidPayload(
                "forecast contains no points".to_string(),
            ));
        }

        Ok(result)
    }
}

/// Raw JSON text sliced out of a model reply.
///
/// Guaranteed to start with `{` and end with `}`, nothing more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastPayload(String);

impl ForecastPayload {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Keeps the newest `max_rows` readings of an ascending history window.
pub fn cap_history(mut history: Vec<Reading>, max_rows: usize) -> Vec<Reading> {
    if history.len() > max_rows {
        let excess = history.len() - max_rows;
        debug!(dropped = excess, kept = max_rows, "Capping forecast history");
        history.drain(..excess);
    }
    history
}

/// Builds prompts, calls the model under a timeout and extracts JSON.
///
/// Each call makes exactly one model request. No retries, no caching.
pub struct ForecastPipeline {
    model: Arc<dyn ForecastModel>,
    horizon_hours: u32,
    timeout: Duration,
}

impl ForecastPipeline {
    pub fn new(model: Arc<dyn ForecastModel>, config: &ForecastConfig) -> Self {
        Self::with_settings(
            model,
            config.horizon_hours,
            Duration::from_secs(config.timeout_seconds),
        )
    }

    pub fn with_settings(model: Arc<dyn ForecastModel>, horizon_hours: u32, timeout: Duration) -> Self {
        Self {
            model,
            horizon_hours,
            timeout,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Forecasts the next `horizon_hours` from a history window.
    ///
    /// An empty window is valid; the model is told to extrapolate anyway.
    pub async fn forecast(&self, history: &[Reading]) -> Result<ForecastPayload, ForecastError> {
        let prompt = build_forecast_prompt(history, self.horizon_hours);
        debug!(
            readings = history.len(),
            horizon_hours = self.horizon_hours,
            "Requesting forecast"
        );

        let text = self.generate(&prompt).await?;
        let payload = extract_json_payload(&text).map_err(|e| {
            warn!(model = %self.model.name(), "Model reply contained no JSON object");
            e
        })?;

        Ok(ForecastPayload(payload.to_string()))
    }

    /// Point-in-time risk assessment from current sensor values.
    pub async fn assess(&self, input: &AssessmentInput) -> Result<RiskAssessment, ForecastError> {
        let prompt = build_assessment_prompt(input);
        let text = self.generate(&prompt).await?;
        let payload = extract_json_payload(&text)?;
        RiskAssessment::from_payload(payload)
    }

    pub async fn list_models(&self) -> Result<Vec<String>, ForecastError> {
        self.with_timeout(self.model.list_models()).await
    }

    async fn generate(&self, prompt: &str) -> Result<String, ForecastError> {
        self.with_timeout(self.model.generate(prompt)).await
    }

    async fn with_timeout<T, F>(&self, call: F) -> Result<T, ForecastError>
    where
        F: std::future::Future<Output = Result<T, ForecastError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ForecastError::Unavailable(format!(
                "{} did not respond within {}s",
                self.model.name(),
                self.timeout.as_secs()
            ))),
        }
    }
}
