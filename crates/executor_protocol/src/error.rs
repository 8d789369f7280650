use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid server origin '{origin}': {reason}")]
    InvalidOrigin { origin: String, reason: String },

    #[error("unsupported origin scheme '{scheme}'; expected http, https, ws or wss")]
    UnsupportedScheme { scheme: String },

    #[error("failed to encode client message: {0}")]
    Encode(#[from] serde_json::Error),
}
