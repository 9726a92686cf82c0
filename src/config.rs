//! Client configuration parsed from environment variables.

use std::path::PathBuf;

use crate::error::ClientError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const FALLBACK_STATE_FILE: &str = ".meetroom-session.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// REST API root, without a trailing slash (e.g. `"http://localhost:8080/api"`).
    pub api_base_url: String,
    /// File backing the durable session entries.
    pub state_file: PathBuf,
    pub timeouts: Timeouts,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `MEETROOM_API_BASE_URL`: default `http://localhost:8080/api`
    /// - `MEETROOM_STATE_FILE`: default `$HOME/.meetroom/session.json`
    /// - `MEETROOM_REQUEST_TIMEOUT_SECS`: default 30
    /// - `MEETROOM_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the base URL is not an http(s) URL.
    pub fn from_env() -> Result<Self, ClientError> {
        let api_base_url = std::env::var("MEETROOM_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let state_file = std::env::var("MEETROOM_STATE_FILE")
            .ok()
            .filter(|s| !s.is_empty())
            .map_or_else(default_state_file, PathBuf::from);
        let timeouts = Timeouts {
            request_secs: env_parse_u64("MEETROOM_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("MEETROOM_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Self::new(api_base_url, state_file).map(|cfg| cfg.with_timeouts(timeouts))
    }

    /// Build config from explicit values with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the base URL is not an http(s) URL.
    pub fn new(api_base_url: impl Into<String>, state_file: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let api_base_url = normalize_base_url(&api_base_url.into())?;
        Ok(Self { api_base_url, state_file: state_file.into(), timeouts: Timeouts::default() })
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ClientError::Config(format!("invalid base URL: {raw}")));
    }
    Ok(trimmed.to_string())
}

fn default_state_file() -> PathBuf {
    std::env::var("HOME")
        .ok()
        .filter(|home| !home.is_empty())
        .map_or_else(
            || PathBuf::from(FALLBACK_STATE_FILE),
            |home| PathBuf::from(home).join(".meetroom").join("session.json"),
        )
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
