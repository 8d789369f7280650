use crate::error::TransportError;
use crate::event::EventSink;

/// Handle to one live (or still opening) connection.
pub trait Connection: Send {
    /// Transmits one text frame. Never queues for delivery after a reconnect.
    fn send_text(&mut self, text: &str) -> Result<(), TransportError>;

    /// Releases the connection. Events it emits afterwards are stale.
    fn close(&mut self);
}

/// Opens connections to the executor.
///
/// `connect` must not block on the handshake: the outcome is reported through
/// `events` (`opened`, then `message`s, then `closed`/`failed`).
pub trait Connector: Send {
    fn connect(
        &mut self,
        url: &str,
        events: EventSink,
    ) -> Result<Box<dyn Connection>, TransportError>;
}
