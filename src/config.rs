use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub port: u16,
    pub preferences_path: PathBuf,
    pub http_timeout: Duration,
    /// Browser sessions untouched for this long are dropped.
    pub session_idle_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests do not
    /// have to touch the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_base_url = lookup("CHURN_API_BASE_URL")
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let preferences_path = lookup("APP_PREFERENCES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/preferences.json"));

        let timeout_secs = lookup("CHURN_HTTP_TIMEOUT_SECS")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let session_idle_secs = lookup("CHURN_SESSION_IDLE_SECS")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_SESSION_IDLE_SECS);

        Self {
            api_base_url,
            port,
            preferences_path,
            http_timeout: Duration::from_secs(timeout_secs),
            session_idle_timeout: Duration::from_secs(session_idle_secs),
        }
    }
}
