use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration loaded from environment variables or TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Whether the visit-capture middleware records anything at all.
    /// When false, every request passes through with zero side effects.
    #[serde(default = "default_capture_enabled")]
    pub capture_enabled: bool,
    /// Dashboard origin for CORS restrictions on the insights read API.
    /// If not set, the read API allows any origin.
    #[serde(default)]
    pub dashboard_origin: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/insights.duckdb")
}

const fn default_capture_enabled() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            capture_enabled: default_capture_enabled(),
            dashboard_origin: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults.
    ///
    /// Environment variables override file values:
    /// - `INSIGHTS_HOST` → host
    /// - `INSIGHTS_PORT` → port
    /// - `INSIGHTS_DB_PATH` → db_path
    /// - `INSIGHTS_CAPTURE_ENABLED` → capture_enabled
    /// - `INSIGHTS_DASHBOARD_ORIGIN` → dashboard_origin
    pub fn load(config_path: Option<&Path>) -> Self {
        let mut config =
            config_path.map_or_else(Self::default, |path| match std::fs::read_to_string(path) {
                Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                    tracing::warn!("Failed to parse config file: {e}, using defaults");
                    Self::default()
                }),
                Err(e) => {
                    tracing::warn!("Failed to read config file: {e}, using defaults");
                    Self::default()
                }
            });

        // Environment variable overrides
        if let Ok(host) = std::env::var("INSIGHTS_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("INSIGHTS_PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }
        if let Ok(db_path) = std::env::var("INSIGHTS_DB_PATH") {
            config.db_path = PathBuf::from(db_path);
        }
        if let Ok(val) = std::env::var("INSIGHTS_CAPTURE_ENABLED") {
            config.capture_enabled = val != "0" && val.to_lowercase() != "false";
        }
        if let Ok(origin) = std::env::var("INSIGHTS_DASHBOARD_ORIGIN") {
            config.dashboard_origin = Some(origin);
        }

        config
    }
}
