//! Client configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local development.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default backend base URL.
const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend API base URL (no trailing slash)
    pub api_base_url: String,
    /// Where the persisted session (token + user) lives
    pub session_file: PathBuf,
    /// Notification polling period
    pub poll_interval: Duration,
    /// How many notifications the dashboard panel shows
    pub notification_limit: u32,
    /// Delay before an auth redirect so the banner stays readable
    pub redirect_delay: Duration,
    /// Per-request timeout for backend calls
    pub request_timeout: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            session_file: PathBuf::from(".clinic_session.json"),
            poll_interval: Duration::from_millis(300_000),
            notification_limit: 5,
            redirect_delay: Duration::from_millis(2_000),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();

        Ok(Self {
            api_base_url: env::var("CLINIC_API_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            session_file: env::var("CLINIC_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_file),
            poll_interval: Duration::from_millis(parse_nonzero_var(
                "CLINIC_POLL_INTERVAL_MS",
                300_000,
            )?),
            notification_limit: parse_var("CLINIC_NOTIFICATION_LIMIT", 5)?,
            redirect_delay: Duration::from_millis(parse_var("CLINIC_REDIRECT_DELAY_MS", 2_000)?),
            request_timeout: Duration::from_secs(parse_var("CLINIC_REQUEST_TIMEOUT_SECS", 10)?),
        })
    }

    /// Config pointed at a specific backend, everything else default.
    pub fn for_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Like `parse_var`, but zero is rejected.
fn parse_nonzero_var(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match parse_var(key, default)? {
        0 => Err(ConfigError::Invalid {
            key,
            value: "0".to_string(),
        }),
        value => Ok(value),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
