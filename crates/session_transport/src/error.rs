use std::path::PathBuf;

use executor_protocol::ProtocolError;
use thiserror::Error;

use crate::state::ConnectionState;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("not connected to server (connection is {state})")]
    NotConnected { state: ConnectionState },

    #[error("session transport has been closed")]
    Closed,

    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("failed to send message: {reason}")]
    Send { reason: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl TransportError {
    #[must_use]
    pub fn is_not_connected(&self) -> bool {
        matches!(self, Self::NotConnected { .. } | Self::Closed)
    }
}

#[derive(Debug, Error)]
pub enum ConnectionIdError {
    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse connection record at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize connection record for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to format current UTC timestamp as RFC3339: {0}")]
    ClockFormat(#[source] time::error::Format),
}

impl ConnectionIdError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
