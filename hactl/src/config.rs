//! Connection settings resolved from flags, the environment, and `.env`.
//!
//! `main` loads `.env` with dotenvy before clap parses, so `--url`/`--token`
//! already see `HASS_URL`/`HASS_TOKEN` from either source. The rest are
//! read here:
//! - `HACTL_MEMORY_DIR`: memory storage root, default `./memory`
//! - `HACTL_WS_TIMEOUT_SECS`: WebSocket read timeout, default 30

use std::path::PathBuf;
use std::time::Duration;

use hassws::ConnectOptions;

use crate::error::CliError;

pub const DEFAULT_MEMORY_DIR: &str = "memory";
pub const DEFAULT_WS_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HassConfig {
    /// Base URL without a trailing slash, e.g. `https://ha.local:8123`.
    pub base_url: String,
    pub token: String,
    pub ws_timeout: Duration,
}

impl HassConfig {
    /// Build a config from the resolved `--url` and `--token` values.
    ///
    /// # Errors
    ///
    /// [`CliError::MissingUrl`] or [`CliError::MissingToken`] when either is
    /// absent or blank.
    pub fn resolve(url: Option<&str>, token: Option<&str>) -> Result<Self, CliError> {
        let base_url = non_blank(url).ok_or(CliError::MissingUrl)?.trim_end_matches('/').to_owned();
        let token = non_blank(token).ok_or(CliError::MissingToken)?.to_owned();
        let ws_timeout = Duration::from_secs(env_parse_u64("HACTL_WS_TIMEOUT_SECS", DEFAULT_WS_TIMEOUT_SECS));
        Ok(Self { base_url, token, ws_timeout })
    }

    #[must_use]
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions { read_timeout: Some(self.ws_timeout), ..ConnectOptions::default() }
    }
}

/// Memory storage root from `HACTL_MEMORY_DIR`, else `./memory`.
#[must_use]
pub fn memory_root() -> PathBuf {
    std::env::var("HACTL_MEMORY_DIR")
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_MEMORY_DIR), PathBuf::from)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
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
