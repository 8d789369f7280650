//! Environment configuration.

use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

use executor_protocol::{ProtocolMode, DEFAULT_SOCKET_PATH};
use project_model::DEFAULT_HISTORY_LIMIT;
use session_transport::{
    ReconnectPolicy, TransportConfig, DEFAULT_LIVENESS_INTERVAL_MS,
    DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_DELAY_MS, DEFAULT_SERVER_ORIGIN,
};
use thiserror::Error;

pub const DEFAULT_STATE_DIR: &str = ".runpad";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got {value:?}: {source}")]
    InvalidNumber {
        key: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub server_origin: String,
    pub socket_path: String,
    pub max_reconnect_attempts: u32,
    pub reconnect_delay_ms: u64,
    pub liveness_interval_ms: u64,
    pub state_dir: PathBuf,
    pub history_limit: usize,
    pub tagged_protocol: bool,
    pub log_filter: String,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            server_origin: DEFAULT_SERVER_ORIGIN.to_string(),
            socket_path: DEFAULT_SOCKET_PATH.to_string(),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            liveness_interval_ms: DEFAULT_LIVENESS_INTERVAL_MS,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            history_limit: DEFAULT_HISTORY_LIMIT,
            tagged_protocol: false,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            server_origin: env_string_opt("RUNPAD_SERVER_ORIGIN").unwrap_or(defaults.server_origin),
            socket_path: env_string_opt("RUNPAD_SOCKET_PATH").unwrap_or(defaults.socket_path),
            max_reconnect_attempts: env_number("RUNPAD_MAX_RECONNECT_ATTEMPTS")?
                .unwrap_or(defaults.max_reconnect_attempts),
            reconnect_delay_ms: env_number("RUNPAD_RECONNECT_DELAY_MS")?
                .unwrap_or(defaults.reconnect_delay_ms),
            liveness_interval_ms: env_number("RUNPAD_LIVENESS_INTERVAL_MS")?
                .unwrap_or(defaults.liveness_interval_ms),
            state_dir: env_string_opt("RUNPAD_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_dir),
            history_limit: env_number("RUNPAD_HISTORY_LIMIT")?.unwrap_or(defaults.history_limit),
            tagged_protocol: env_flag("RUNPAD_TAGGED_PROTOCOL"),
            log_filter: env_string_opt("RUNPAD_LOG").unwrap_or(defaults.log_filter),
        })
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: self.max_reconnect_attempts,
            delay: Duration::from_millis(self.reconnect_delay_ms),
            liveness_interval: Duration::from_millis(self.liveness_interval_ms),
        }
    }

    pub fn transport_config(&self, connection_id: impl Into<String>) -> TransportConfig {
        TransportConfig::new(self.server_origin.clone(), connection_id)
            .with_socket_path(self.socket_path.clone())
            .with_policy(self.reconnect_policy())
    }

    pub fn protocol_mode(&self) -> ProtocolMode {
        if self.tagged_protocol {
            ProtocolMode::Tagged
        } else {
            ProtocolMode::Legacy
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

fn env_number<T>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr<Err = ParseIntError>,
{
    let Some(value) = env_string_opt(key) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|source| ConfigError::InvalidNumber { key, value, source })
}
