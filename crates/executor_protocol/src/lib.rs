//! Wire contract between the editor shell and the remote executor.
//!
//! Outbound traffic is a small tagged JSON record (`execute` / `input`).
//! Inbound traffic is either plain text, classified by marker substrings, or
//! an opt-in tagged frame carrying an explicit `kind`. Both decode into
//! [`InboundEvent`] so callers drive one state machine regardless of mode.

pub mod endpoint;
pub mod error;
pub mod inbound;
pub mod message;

pub use endpoint::{connection_url, CONNECTION_ID_PARAM, DEFAULT_SOCKET_PATH};
pub use error::ProtocolError;
pub use inbound::{
    classify_legacy, FrameKind, InboundDecoder, InboundEvent, InboundFrame, InboundSignal,
    ProtocolMode,
    INPUT_PROMPT_MARKER, PROCESS_EXIT_MARKER,
};
pub use message::ClientMessage;
