//! Program lifecycle driven by user actions and executor output.

use executor_protocol::{ClientMessage, InboundDecoder, InboundEvent, InboundSignal, ProtocolMode};
use session_transport::{ConnectionState, SessionTransport, TransportError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::surface::{error_line, TerminalSurface};

pub const NOT_CONNECTED_MESSAGE: &str = "Not connected to server";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgramState {
    #[default]
    Idle,
    Running,
    Error,
}

impl ProgramState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("not connected to server")]
    NotConnected,

    #[error("failed to submit program: {0}")]
    Send(#[source] TransportError),
}

/// Outbound side of the session, as the controller sees it.
pub trait MessageSink {
    fn is_open(&self) -> bool;
    fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError>;
}

impl MessageSink for SessionTransport {
    fn is_open(&self) -> bool {
        SessionTransport::is_open(self)
    }

    fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError> {
        SessionTransport::send(self, message)
    }
}

/// Translates Run/input actions into protocol messages and inbound text into
/// [`ProgramState`] transitions.
#[derive(Debug, Default)]
pub struct ExecutionController {
    state: ProgramState,
    decoder: InboundDecoder,
    last_error: Option<String>,
    pending_input: String,
}

impl ExecutionController {
    pub fn new(mode: ProtocolMode) -> Self {
        Self {
            decoder: InboundDecoder::new(mode),
            ..Self::default()
        }
    }

    pub fn state(&self) -> ProgramState {
        self.state
    }

    pub fn protocol_mode(&self) -> ProtocolMode {
        self.decoder.mode()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Input typed since the last line break.
    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    /// Submits `code` for execution.
    ///
    /// With no open connection the transport is not contacted at all.
    pub fn run(
        &mut self,
        code: &str,
        sink: &mut dyn MessageSink,
        terminal: &mut dyn TerminalSurface,
    ) -> Result<(), RunError> {
        if !sink.is_open() {
            warn!("run requested while disconnected");
            self.fail(NOT_CONNECTED_MESSAGE.to_string(), terminal);
            return Err(RunError::NotConnected);
        }

        self.last_error = None;
        self.state = ProgramState::Running;
        terminal.clear();
        terminal.write("\r\n");

        match sink.send(&ClientMessage::execute(code)) {
            Ok(()) => {
                info!(bytes = code.len(), "submitted program");
                Ok(())
            }
            Err(error) => {
                warn!(error = %error, "failed to submit program");
                self.last_error = Some(format!("Error running code: {error}"));
                self.state = ProgramState::Error;
                terminal.write(&error_line(&format!("Error: {error}")));
                Err(RunError::Send(error))
            }
        }
    }

    /// Forwards raw input to the running program. Delivery is best effort.
    pub fn send_input(&mut self, text: &str, sink: &mut dyn MessageSink) {
        self.track_input(text);
        match sink.send(&ClientMessage::input(text)) {
            Ok(()) => {}
            Err(error) if error.is_not_connected() => {
                debug!("dropping input while disconnected");
            }
            Err(error) => warn!(error = %error, "failed to send input"),
        }
    }

    /// Interprets one inbound chunk and renders whatever is meant for the user.
    pub fn on_inbound(&mut self, text: &str, terminal: &mut dyn TerminalSurface) -> InboundEvent {
        let event = self.decoder.decode(text);
        match event.display_text() {
            Some(display) => {
                terminal.write(display);
                terminal.scroll_to_bottom();
            }
            None => debug!(text, "suppressed connection lifecycle text"),
        }

        match event.signal {
            InboundSignal::Exited => {
                self.pending_input.clear();
                if self.state == ProgramState::Running {
                    info!("program exited");
                    self.state = ProgramState::Idle;
                }
            }
            InboundSignal::Prompt => terminal.focus(),
            InboundSignal::None => {}
        }
        event
    }

    /// Any connection change invalidates the partially typed input line.
    pub fn on_connection_state(&mut self, state: ConnectionState) {
        if state != ConnectionState::Connecting {
            self.pending_input.clear();
        }
    }

    fn fail(&mut self, message: String, terminal: &mut dyn TerminalSurface) {
        terminal.write(&error_line(&format!("Error: {message}")));
        self.last_error = Some(message);
        self.state = ProgramState::Error;
    }

    fn track_input(&mut self, text: &str) {
        for ch in text.chars() {
            match ch {
                '\r' | '\n' => self.pending_input.clear(),
                '\u{7f}' | '\u{8}' => {
                    self.pending_input.pop();
                }
                _ => self.pending_input.push(ch),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingTerminal {
        writes: Vec<String>,
        clears: usize,
        focuses: usize,
    }

    impl TerminalSurface for RecordingTerminal {
        fn write(&mut self, text: &str) {
            self.writes.push(text.to_string());
        }

        fn clear(&mut self) {
            self.clears += 1;
        }

        fn focus(&mut self) {
            self.focuses += 1;
        }

        fn scroll_to_bottom(&mut self) {}
    }

    #[test]
    fn program_state_names() {
        assert_eq!(ProgramState::default().as_str(), "idle");
        assert_eq!(ProgramState::Running.as_str(), "running");
        assert_eq!(ProgramState::Error.as_str(), "error");
    }

    #[test]
    fn pending_input_tracks_the_current_line() {
        struct Closed;
        impl MessageSink for Closed {
            fn is_open(&self) -> bool {
                false
            }
            fn send(&mut self, _message: &ClientMessage) -> Result<(), TransportError> {
                Err(TransportError::NotConnected {
                    state: ConnectionState::Disconnected,
                })
            }
        }

        let mut controller = ExecutionController::default();
        controller.send_input("ab", &mut Closed);
        controller.send_input("\u{7f}c", &mut Closed);
        assert_eq!(controller.pending_input(), "ac");

        controller.send_input("\r", &mut Closed);
        assert_eq!(controller.pending_input(), "");
    }

    #[test]
    fn prompt_requests_focus_without_state_change() {
        let mut controller = ExecutionController::default();
        let mut terminal = RecordingTerminal::default();

        let event = controller.on_inbound("Enter first number: ", &mut terminal);

        assert!(event.is_prompt());
        assert_eq!(terminal.focuses, 1);
        assert_eq!(terminal.clears, 0);
        assert_eq!(controller.state(), ProgramState::Idle);
    }
}
