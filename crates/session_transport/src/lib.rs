//! One logical session to the remote executor.
//!
//! [`SessionTransport`] owns the single live connection, its reconnect timer
//! and its liveness timer. Callers see `send` plus the inbound text returned
//! from [`SessionTransport::handle_event`]; reconnection is invisible to them.
//!
//! The transport never sleeps or spawns timers itself. Time is passed in and
//! [`SessionTransport::next_deadline`] tells the owning event loop how long it
//! may block, which keeps the state machine deterministic under test.
//! Connections are opened through the [`Connector`] seam; the production
//! implementation is [`WebSocketConnector`].

mod connection_id;
mod connector;
mod error;
mod event;
mod policy;
mod state;
mod transport;
mod websocket;

pub use connection_id::{ConnectionIdStore, ConnectionRecord, CONNECTION_FILE_NAME};
pub use connector::{Connection, Connector};
pub use error::{ConnectionIdError, TransportError};
pub use event::{ConnectionEvent, ConnectionEventKind, EventSink, Generation};
pub use policy::{
    ReconnectPolicy, TransportConfig, DEFAULT_LIVENESS_INTERVAL_MS, DEFAULT_MAX_RECONNECT_ATTEMPTS,
    DEFAULT_RECONNECT_DELAY_MS, DEFAULT_SERVER_ORIGIN,
};
pub use state::ConnectionState;
pub use transport::{SessionTransport, TransportOutput};
pub use websocket::{WebSocketConnector, DEFAULT_READ_POLL_INTERVAL};
