//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default delay between the last tool call of a turn and the task refresh.
pub const DEFAULT_REFRESH_DELAY_MS: u64 = 500;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash.
    pub api_base_url: String,
    /// Directory holding the persisted session entry.
    pub data_dir: PathBuf,
    /// Delay before the refresh callback fires after a turn with tool calls.
    pub refresh_delay: Duration,
    /// Act as the demo user when nobody is signed in.
    pub allow_demo_user: bool,
    /// Navigate to the dashboard after sign-in / sign-up.
    pub redirect_after_auth: bool,
    /// Per-request timeout for backend calls.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            data_dir: default_data_dir(),
            refresh_delay: Duration::from_millis(DEFAULT_REFRESH_DELAY_MS),
            allow_demo_user: true,
            redirect_after_auth: true,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Build configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_base_url = std::env::var("TODO_CHAT_API_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.api_base_url);

        let data_dir = std::env::var("TODO_CHAT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let refresh_delay = std::env::var("TODO_CHAT_REFRESH_DELAY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.refresh_delay);

        let allow_demo_user = env_flag("TODO_CHAT_ALLOW_DEMO_USER").unwrap_or(defaults.allow_demo_user);

        let redirect_after_auth =
            env_flag("TODO_CHAT_REDIRECT_AFTER_AUTH").unwrap_or(defaults.redirect_after_auth);

        let request_timeout = std::env::var("TODO_CHAT_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        Self {
            api_base_url,
            data_dir,
            refresh_delay,
            allow_demo_user,
            redirect_after_auth,
            request_timeout,
        }
    }

    /// Reject values the client cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "TODO_CHAT_API_URL".into(),
                message: format!("expected an http(s) URL, got '{}'", self.api_base_url),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "TODO_CHAT_REQUEST_TIMEOUT_SECS".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".todo-chat")
}

/// Parse a boolean-ish environment variable (`1/0`, `true/false`, `yes/no`).
fn env_flag(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
