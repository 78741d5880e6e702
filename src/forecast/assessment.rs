use super::{ForecastError, RiskLevel};
use serde::{Deserialize, Serialize};

/// Current conditions fed to a black ice assessment.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentInput {
    pub temperature: f64,
    pub humidity: f64,
    /// Raw wetness/soil sensor reading (0-4095)
    pub wetness_raw: f64,
}

/// Validated point-in-time risk assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk: RiskLevel,
    pub message: String,
    pub actions: Vec<String>,
}

impl RiskAssessment {
    /// Validates an extracted JSON payload. `risk`, `message` and `actions`
    /// are all required; no defaults are guessed.
    pub fn from_payload(payload: &str) -> Result<Self, ForecastError> {
        serde_json::from_str(payload).map_err(|e| ForecastError::InvalidPayload(e.to_string()))
    }
}
