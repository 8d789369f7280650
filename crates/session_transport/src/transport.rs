use std::time::Instant;

use executor_protocol::ClientMessage;
use tracing::{debug, info, trace, warn};

use crate::connector::{Connection, Connector};
use crate::error::TransportError;
use crate::event::{ConnectionEvent, ConnectionEventKind, EventSink, Generation};
use crate::policy::{ReconnectPolicy, TransportConfig};
use crate::state::ConnectionState;

/// What the owner must act on after feeding an event to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOutput {
    /// Inbound text, in arrival order.
    Inbound(String),
    StateChanged(ConnectionState),
}

/// Single logical connection with fixed-delay reconnects and a liveness check.
///
/// Invariants:
/// - at most one live [`Connection`]; the previous one is closed before a new
///   attempt is made
/// - at most one pending reconnect deadline
/// - the attempt counter only resets on a successful open
/// - after [`SessionTransport::close`] nothing reconnects
pub struct SessionTransport {
    config: TransportConfig,
    url: String,
    connector: Box<dyn Connector>,
    sink: EventSink,
    state: ConnectionState,
    connection: Option<Box<dyn Connection>>,
    generation: Generation,
    attempts: u32,
    reconnect_at: Option<Instant>,
    liveness_at: Option<Instant>,
}

impl SessionTransport {
    pub fn new(
        config: TransportConfig,
        connector: impl Connector + 'static,
        sink: EventSink,
    ) -> Result<Self, TransportError> {
        let url = config.socket_url()?;
        Ok(Self {
            config,
            url,
            connector: Box::new(connector),
            sink,
            state: ConnectionState::Disconnected,
            connection: None,
            generation: 0,
            attempts: 0,
            reconnect_at: None,
            liveness_at: None,
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn connection_id(&self) -> &str {
        &self.config.connection_id
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.config.policy
    }

    /// Reconnect attempts scheduled since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_at.is_some()
    }

    /// Disconnected with no reconnect left to try.
    pub fn gave_up(&self) -> bool {
        self.state == ConnectionState::Disconnected && self.reconnect_at.is_none()
    }

    /// Earliest instant at which [`SessionTransport::poll_timers`] has work.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.reconnect_at, self.liveness_at) {
            (Some(reconnect), Some(liveness)) => Some(reconnect.min(liveness)),
            (reconnect, liveness) => reconnect.or(liveness),
        }
    }

    /// Arms the liveness check and makes the first connection attempt.
    pub fn open(&mut self, now: Instant) -> Result<(), TransportError> {
        if self.state == ConnectionState::Closed {
            return Err(TransportError::Closed);
        }

        self.liveness_at = Some(now + self.config.policy.liveness_interval);
        self.connect(now);
        Ok(())
    }

    /// Starts a new connection attempt unless one is already open.
    pub fn connect(&mut self, now: Instant) {
        match self.state {
            ConnectionState::Closed => {
                debug!(url = %self.url, "ignoring connect on closed transport");
                return;
            }
            ConnectionState::Open => return,
            ConnectionState::Disconnected | ConnectionState::Connecting => {}
        }

        self.reconnect_at = None;
        if let Some(mut previous) = self.connection.take() {
            previous.close();
        }

        self.generation += 1;
        self.state = ConnectionState::Connecting;
        info!(
            url = %self.url,
            generation = self.generation,
            attempts = self.attempts,
            "connecting to executor"
        );

        let events = self.sink.for_generation(self.generation);
        match self.connector.connect(&self.url, events) {
            Ok(connection) => self.connection = Some(connection),
            Err(error) => {
                warn!(url = %self.url, error = %error, "connection attempt failed");
                self.state = ConnectionState::Disconnected;
                self.schedule_reconnect(now);
            }
        }
    }

    /// Serializes and transmits `message`. Fails fast unless the connection is open.
    pub fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError> {
        if self.state != ConnectionState::Open {
            return Err(TransportError::NotConnected { state: self.state });
        }
        let Some(connection) = self.connection.as_mut() else {
            return Err(TransportError::NotConnected { state: self.state });
        };

        let payload = message.encode()?;
        connection.send_text(&payload).inspect_err(|error| {
            warn!(kind = message.kind(), error = %error, "failed to send message");
        })?;
        debug!(kind = message.kind(), bytes = payload.len(), "sent message");
        Ok(())
    }

    /// Applies one connection event. Events from superseded attempts are dropped.
    pub fn handle_event(
        &mut self,
        event: ConnectionEvent,
        now: Instant,
    ) -> Option<TransportOutput> {
        if event.generation != self.generation || self.state == ConnectionState::Closed {
            trace!(
                event_generation = event.generation,
                current_generation = self.generation,
                "dropping stale connection event"
            );
            return None;
        }

        match event.kind {
            ConnectionEventKind::Opened => {
                info!(url = %self.url, generation = self.generation, "connected to executor");
                self.state = ConnectionState::Open;
                self.attempts = 0;
                self.reconnect_at = None;
                Some(TransportOutput::StateChanged(ConnectionState::Open))
            }
            ConnectionEventKind::Message(text) => Some(TransportOutput::Inbound(text)),
            ConnectionEventKind::Closed { reason } => {
                info!(generation = self.generation, reason = %reason, "connection closed");
                self.on_connection_lost(now)
            }
            ConnectionEventKind::Failed { error } => {
                warn!(generation = self.generation, error = %error, "connection error");
                self.on_connection_lost(now)
            }
        }
    }

    /// Fires the reconnect and liveness timers that are due at `now`.
    pub fn poll_timers(&mut self, now: Instant) {
        if self.reconnect_at.is_some_and(|deadline| now >= deadline) {
            self.reconnect_at = None;
            info!(attempt = self.attempts, "reconnecting to executor");
            self.connect(now);
        }

        if self.liveness_at.is_some_and(|deadline| now >= deadline) {
            self.liveness_at = Some(now + self.config.policy.liveness_interval);
            let needs_connection = matches!(
                self.state,
                ConnectionState::Disconnected | ConnectionState::Connecting
            );
            if needs_connection && self.config.policy.allows(self.attempts) {
                debug!(state = %self.state, "liveness check found no open connection");
                self.connect(now);
            }
        }
    }

    /// Cancels both timers, then releases the connection. Idempotent.
    pub fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }

        self.reconnect_at = None;
        self.liveness_at = None;
        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }
        self.state = ConnectionState::Closed;
        self.generation += 1;
        info!(url = %self.url, "session transport closed");
    }

    fn on_connection_lost(&mut self, now: Instant) -> Option<TransportOutput> {
        if self.state == ConnectionState::Disconnected {
            return None;
        }

        self.state = ConnectionState::Disconnected;
        self.schedule_reconnect(now);
        Some(TransportOutput::StateChanged(ConnectionState::Disconnected))
    }

    fn schedule_reconnect(&mut self, now: Instant) {
        if self.reconnect_at.is_some() {
            return;
        }
        if !self.config.policy.allows(self.attempts) {
            warn!(
                max_attempts = self.config.policy.max_attempts,
                "reconnect attempts exhausted"
            );
            return;
        }

        self.attempts += 1;
        self.reconnect_at = Some(now + self.config.policy.delay);
        info!(
            attempt = self.attempts,
            delay_ms = self.config.policy.delay.as_millis() as u64,
            "scheduled reconnect"
        );
    }
}

impl Drop for SessionTransport {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SessionTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTransport")
            .field("url", &self.url)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("attempts", &self.attempts)
            .field("reconnect_at", &self.reconnect_at)
            .field("liveness_at", &self.liveness_at)
            .finish_non_exhaustive()
    }
}
