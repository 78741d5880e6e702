use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::forecast::GEMINI_BASE_URL;
use crate::store::DEFAULT_HISTORY_HOURS;

/// Default config file, overridable with SENSORCAST_CONFIG
pub const DEFAULT_CONFIG_PATH: &str = "sensorcast.toml";

/// Complete Sensorcast configuration.
///
/// Built once at startup and shared read-only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SensorcastConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
}

/// Reading store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("sensor_data.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// History window used when /api/forecast has no `hours` parameter
    #[serde(default = "default_history_hours")]
    pub default_history_hours: u32,
    /// HTML file served at `/`
    #[serde(default)]
    pub dashboard_path: Option<PathBuf>,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_history_hours() -> u32 {
    DEFAULT_HISTORY_HOURS
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            default_history_hours: default_history_hours(),
            dashboard_path: None,
        }
    }
}

/// Forecasting model configuration
#[derive(Clone, Deserialize)]
pub struct ForecastConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Number of hourly points requested from the model
    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: u32,
    /// Newest readings kept in a forecast prompt
    #[serde(default = "default_max_history_rows")]
    pub max_history_rows: usize,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Validate the forecast shape before returning it
    #[serde(default)]
    pub strict_schema: bool,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_base_url() -> String {
    GEMINI_BASE_URL.to_string()
}

fn default_horizon_hours() -> u32 {
    5
}

fn default_max_history_rows() -> usize {
    500
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            horizon_hours: default_horizon_hours(),
            max_history_rows: default_max_history_rows(),
            timeout_seconds: default_timeout_seconds(),
            strict_schema: false,
        }
    }
}

impl fmt::Debug for ForecastConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("horizon_hours", &self.horizon_hours)
            .field("max_history_rows", &self.max_history_rows)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("strict_schema", &self.strict_schema)
            .finish()
    }
}

impl SensorcastConfig {
    /// Loads the config file named by SENSORCAST_CONFIG (or the default
    /// path), then applies environment overrides. A missing file means
    /// defaults.
    pub fn load() -> Result<Self> {
        let path = std::env::var("SENSORCAST_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&path).exists() {
            load_config(&path)?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies overrides from a key lookup (the process environment in
    /// production). Unparseable numeric values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SENSORCAST_DB") {
            self.store.path = PathBuf::from(v);
        }
        if let Some(v) = lookup("SENSORCAST_PORT") {
            if let Ok(port) = v.parse::<u16>() {
                self.api.port = port;
            }
        }
        if let Some(v) = lookup("SENSORCAST_DASHBOARD") {
            self.api.dashboard_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("SENSORCAST_MODEL") {
            self.forecast.model = v;
        }
        if let Some(key) = lookup("GOOGLE_API_KEY").or_else(|| lookup("GEMINI_API_KEY")) {
            if !key.trim().is_empty() {
                self.forecast.api_key = Some(key.trim().to_string());
            }
        }
    }
}

/// Load configuration from TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SensorcastConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: SensorcastConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = SensorcastConfig::default();
        assert_eq!(config.store.path, PathBuf::from("sensor_data.db"));
        assert_eq!(config.api.port, 3000);
        assert_eq!(config.api.default_history_hours, 24);
        assert_eq!(config.forecast.model, "gemini-2.5-flash");
        assert_eq!(config.forecast.horizon_hours, 5);
        assert_eq!(config.forecast.max_history_rows, 500);
        assert!(config.forecast.api_key.is_none());
        assert!(!config.forecast.strict_schema);
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
            [store]
            path = "/var/lib/sensors/readings.db"

            [api]
            bind = "127.0.0.1"
            port = 8080
            default_history_hours = 12
            dashboard_path = "frontend/iot.html"

            [forecast]
            api_key = "abc"
            model = "gemini-2.0-flash"
            horizon_hours = 3
            max_history_rows = 100
            timeout_seconds = 10
            strict_schema = true
        "#;

        let config: SensorcastConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.store.path, PathBuf::from("/var/lib/sensors/readings.db"));
        assert_eq!(config.api.bind, "127.0.0.1");
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.api.default_history_hours, 12);
        assert_eq!(
            config.api.dashboard_path,
            Some(PathBuf::from("frontend/iot.html"))
        );
        assert_eq!(config.forecast.api_key.as_deref(), Some("abc"));
        assert_eq!(config.forecast.model, "gemini-2.0-flash");
        assert_eq!(config.forecast.horizon_hours, 3);
        assert_eq!(config.forecast.timeout_seconds, 10);
        assert!(config.forecast.strict_schema);
    }

    #[test]
    fn test_partial_config() {
        // Missing sections and fields use defaults
        let toml = r#"
            [forecast]
            horizon_hours = 8
        "#;

        let config: SensorcastConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.forecast.horizon_hours, 8);
        assert_eq!(config.forecast.model, "gemini-2.5-flash");
        assert_eq!(config.api.port, 3000);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SENSORCAST_DB", "/tmp/readings.db"),
            ("SENSORCAST_PORT", "4000"),
            ("SENSORCAST_MODEL", "gemini-2.0-flash"),
            ("GEMINI_API_KEY", " secret "),
        ]
        .into_iter()
        .collect();

        let mut config = SensorcastConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.store.path, PathBuf::from("/tmp/readings.db"));
        assert_eq!(config.api.port, 4000);
        assert_eq!(config.forecast.model, "gemini-2.0-flash");
        assert_eq!(config.forecast.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_google_key_takes_precedence() {
        let env: HashMap<&str, &str> = [("GOOGLE_API_KEY", "google"), ("GEMINI_API_KEY", "gemini")]
            .into_iter()
            .collect();

        let mut config = SensorcastConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.forecast.api_key.as_deref(), Some("google"));
    }

    #[test]
    fn test_invalid_port_override_ignored() {
        let mut config = SensorcastConfig::default();
        config.apply_overrides(|k| (k == "SENSORCAST_PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.api.port, 3000);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let mut config = ForecastConfig::default();
        config.api_key = Some("super-secret".to_string());
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensorcast.toml");
        std::fs::write(&path, "[api]\nport = 9000\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.api.port, 9000);

        assert!(load_config(dir.path().join("missing.toml")).is_err());
    }
}
