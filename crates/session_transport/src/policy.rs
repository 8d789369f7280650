use std::time::Duration;

use executor_protocol::{connection_url, ProtocolError, DEFAULT_SOCKET_PATH};

pub const DEFAULT_SERVER_ORIGIN: &str = "http://127.0.0.1:8000";
/// Automatic reconnects allowed before giving up until the next successful open.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
/// Fixed delay between reconnect attempts. There is no exponential backoff.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 2000;
pub const DEFAULT_LIVENESS_INTERVAL_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    /// Period of the safety-net check that reconnects when a close event was lost.
    pub liveness_interval: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            liveness_interval: Duration::from_millis(DEFAULT_LIVENESS_INTERVAL_MS),
        }
    }
}

impl ReconnectPolicy {
    pub fn allows(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

/// Where and how to reach the executor.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Page-style origin, e.g. `https://host:port`; upgraded to a socket scheme.
    pub origin: String,
    pub socket_path: String,
    /// Persisted correlation id so the backend can recognize a reconnect.
    pub connection_id: String,
    pub policy: ReconnectPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_SERVER_ORIGIN.to_string(),
            socket_path: DEFAULT_SOCKET_PATH.to_string(),
            connection_id: String::new(),
            policy: ReconnectPolicy::default(),
        }
    }
}

impl TransportConfig {
    pub fn new(origin: impl Into<String>, connection_id: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            connection_id: connection_id.into(),
            ..Self::default()
        }
    }

    pub fn with_socket_path(mut self, socket_path: impl Into<String>) -> Self {
        self.socket_path = socket_path.into();
        self
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn socket_url(&self) -> Result<String, ProtocolError> {
        connection_url(&self.origin, &self.socket_path, &self.connection_id).map(String::from)
    }
}
