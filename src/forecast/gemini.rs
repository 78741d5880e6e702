use super::{ForecastError, ForecastModel};
use crate::config::ForecastConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

/// Default Generative Language API base URL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini client over the Generative Language REST API.
///
/// The API key travels in the `x-goog-api-key` header so it never appears in
/// request URLs or logs.
pub struct GeminiModel {
    api_key: String,
    model: String,
    base_url: String,
    http_client: Client,
}

impl GeminiModel {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with a mock server).
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client: Client::new(),
        }
    }

    pub fn from_config(config: &ForecastConfig) -> Self {
        Self::with_base_url(
            config.api_key.clone().unwrap_or_default(),
            config.model.clone(),
            config.base_url.clone(),
        )
    }

    /// Pulls the reply text out of a generateContent response.
    pub fn parse_response(json: &Value) -> Result<String, ForecastError> {
        json.pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| {
                ForecastError::Unavailable(
                    "reply missing candidates[0].content.parts[0].text".to_string(),
                )
            })
    }
}

#[async_trait]
impl ForecastModel for GeminiModel {
    async fn generate(&self, prompt: &str) -> Result<String, ForecastError> {
        if self.api_key.is_empty() {
            return Err(ForecastError::Unavailable("no API key configured".to_string()));
        }

        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}]
        });

        tracing::debug!(model = %self.model, "Sending generateContent request");

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ForecastError::Unavailable(format!("gemini request failed: {}", e)))?;

        check_response_status(&response, &self.model)?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| ForecastError::Unavailable(format!("gemini reply unreadable: {}", e)))?;

        Self::parse_response(&json)
    }

    async fn list_models(&self) -> Result<Vec<String>, ForecastError> {
        if self.api_key.is_empty() {
            return Err(ForecastError::Unavailable("no API key configured".to_string()));
        }

        let url = format!("{}/v1beta/models", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| ForecastError::Unavailable(format!("gemini request failed: {}", e)))?;

        check_response_status(&response, &self.model)?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| ForecastError::Unavailable(format!("gemini reply unreadable: {}", e)))?;

        let names = json
            .get("models")
            .and_then(|m| m.as_array())
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m.get("name").and_then(|n| n.as_str()))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(names)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Maps known error codes to descriptive errors.
///
/// - 400/401/403 → credential rejected
/// - 404 → unknown model name
/// - 429 → quota exhausted
/// - Other non-2xx → generic API error
fn check_response_status(response: &reqwest::Response, model: &str) -> Result<(), ForecastError> {
    let reason = match response.status() {
        s if s.is_success() => return Ok(()),
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            format!("gemini rejected the API key ({})", response.status())
        }
        StatusCode::NOT_FOUND => format!("gemini model '{}' not found", model),
        StatusCode::TOO_MANY_REQUESTS => "gemini quota exhausted (429)".to_string(),
        s => format!("gemini API error: {}", s),
    };
    Err(ForecastError::Unavailable(reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const GENERATE_PATH: &str = "/v1beta/models/gemini-test:generateContent";

    #[test]
    fn test_parse_response() {
        let raw = json!({
            "candidates": [{
                "content": {"parts": [{"text": "  {\"summary\":\"ok\"}\n"}]}
            }]
        });
        assert_eq!(
            GeminiModel::parse_response(&raw).unwrap(),
            "{\"summary\":\"ok\"}"
        );
    }

    #[test]
    fn test_parse_response_missing_text() {
        let raw = json!({"candidates": []});
        assert!(matches!(
            GeminiModel::parse_response(&raw),
            Err(ForecastError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_generate() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", GENERATE_PATH)
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(json!({
                "contents": [{"parts": [{"text": "forecast please"}]}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates":[{"content":{"parts":[{"text":"Sure! {\"forecast\":[],\"summary\":\"stable\"}"}]}}]}"#,
            )
            .create_async()
            .await;

        let model = GeminiModel::with_base_url("test-key", "gemini-test", server.url());
        let text = model.generate("forecast please").await.unwrap();

        assert_eq!(text, "Sure! {\"forecast\":[],\"summary\":\"stable\"}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_unknown_model() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", GENERATE_PATH)
            .with_status(404)
            .with_body(r#"{"error":{"message":"not found"}}"#)
            .create_async()
            .await;

        let model = GeminiModel::with_base_url("test-key", "gemini-test", server.url());
        let err = model.generate("hi").await.unwrap_err();
        assert!(err.to_string().contains("'gemini-test' not found"));
    }

    #[tokio::test]
    async fn test_generate_rejected_key() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", GENERATE_PATH)
            .with_status(403)
            .create_async()
            .await;

        let model = GeminiModel::with_base_url("bad-key", "gemini-test", server.url());
        let err = model.generate("hi").await.unwrap_err();
        assert!(err.to_string().contains("rejected the API key"));
    }

    #[tokio::test]
    async fn test_generate_without_key_skips_request() {
        let model = GeminiModel::with_base_url("", "gemini-test", "http://127.0.0.1:9");
        let err = model.generate("hi").await.unwrap_err();
        assert_eq!(
            err,
            ForecastError::Unavailable("no API key configured".to_string())
        );
    }

    #[tokio::test]
    async fn test_list_models() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1beta/models")
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"models":[{"name":"models/gemini-2.5-flash"},{"name":"models/gemini-2.0-flash"}]}"#,
            )
            .create_async()
            .await;

        let model = GeminiModel::with_base_url("test-key", "gemini-test", server.url());
        let names = model.list_models().await.unwrap();

        assert_eq!(names, vec!["models/gemini-2.5-flash", "models/gemini-2.0-flash"]);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let model = GeminiModel::with_base_url("k", "m", "http://localhost:1234/");
        assert_eq!(model.base_url, "http://localhost:1234");
        assert_eq!(model.name(), "m");
    }
}
