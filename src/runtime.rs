//! Serial event loop that owns the session.
//!
//! Connection workers and [`RuntimeHandle`]s post into one queue; the loop
//! applies events in order, then fires transport timers that are due.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::{Duration, Instant};

use session_transport::{
    ConnectionEvent, Connector, EventSink, SessionTransport, TransportConfig, TransportError,
    TransportOutput,
};
use tracing::{debug, info, warn};

use crate::controller::ProgramState;
use crate::shell::EditorShell;
use crate::surface::TerminalSurface;

/// How a submitted program ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The executor reported the exit marker.
    Exited,
    /// The run could not be submitted or the send failed.
    Failed(String),
    /// The connection dropped mid-run and every reconnect failed.
    ConnectionLost,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Submit the active document.
    Run,
    /// Raw input for the running program.
    Input(String),
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Connection(ConnectionEvent),
    Command(Command),
}

/// Cloneable way for other threads to reach the runtime.
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    sender: Sender<SessionEvent>,
}

impl RuntimeHandle {
    /// Queues `command`. Returns `false` once the runtime is gone.
    pub fn dispatch(&self, command: Command) -> bool {
        self.sender.send(SessionEvent::Command(command)).is_ok()
    }

    pub fn run(&self) -> bool {
        self.dispatch(Command::Run)
    }

    pub fn input(&self, text: impl Into<String>) -> bool {
        self.dispatch(Command::Input(text.into()))
    }

    pub fn stop(&self) -> bool {
        self.dispatch(Command::Stop)
    }
}

pub struct SessionRuntime<T: TerminalSurface> {
    shell: EditorShell,
    transport: SessionTransport,
    terminal: T,
    sender: Sender<SessionEvent>,
    events: Receiver<SessionEvent>,
    stopped: bool,
}

impl<T: TerminalSurface> SessionRuntime<T> {
    pub fn new(
        shell: EditorShell,
        config: TransportConfig,
        connector: impl Connector + 'static,
        terminal: T,
    ) -> Result<Self, TransportError> {
        let (sender, events) = mpsc::channel();
        let connection_events = sender.clone();
        let sink = EventSink::new(move |event| {
            let _ = connection_events.send(SessionEvent::Connection(event));
        });
        let transport = SessionTransport::new(config, connector, sink)?;

        Ok(Self {
            shell,
            transport,
            terminal,
            sender,
            events,
            stopped: false,
        })
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            sender: self.sender.clone(),
        }
    }

    pub fn shell(&self) -> &EditorShell {
        &self.shell
    }

    pub fn shell_mut(&mut self) -> &mut EditorShell {
        &mut self.shell
    }

    pub fn transport(&self) -> &SessionTransport {
        &self.transport
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.terminal
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// `None` while the program may still produce output.
    pub fn run_outcome(&self) -> Option<RunOutcome> {
        match self.shell.program_state() {
            ProgramState::Idle => Some(RunOutcome::Exited),
            ProgramState::Error => Some(RunOutcome::Failed(
                self.shell
                    .controller()
                    .last_error()
                    .unwrap_or("program failed")
                    .to_string(),
            )),
            ProgramState::Running if self.transport.gave_up() => Some(RunOutcome::ConnectionLost),
            ProgramState::Running => None,
        }
    }

    /// Opens the session.
    pub fn start(&mut self, now: Instant) -> Result<(), TransportError> {
        self.transport.open(now)
    }

    /// Blocks until the next event or transport deadline, at most `max_wait`.
    ///
    /// Returns `false` once the runtime has stopped.
    pub fn run_once(&mut self, max_wait: Option<Duration>) -> bool {
        if self.stopped {
            return false;
        }

        let now = Instant::now();
        let until_deadline = self
            .transport
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now));
        let wait = match (until_deadline, max_wait) {
            (Some(deadline), Some(max)) => Some(deadline.min(max)),
            (deadline, max) => deadline.or(max),
        };

        let first = match wait {
            Some(wait) => match self.events.recv_timeout(wait) {
                Ok(event) => Some(event),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => {
                    self.stop();
                    return false;
                }
            },
            None => match self.events.recv() {
                Ok(event) => Some(event),
                Err(_) => {
                    self.stop();
                    return false;
                }
            },
        };

        let now = Instant::now();
        if let Some(event) = first {
            self.handle_event(event, now);
        }
        self.process_pending(now);
        !self.stopped
    }

    /// Runs until a [`Command::Stop`] arrives.
    pub fn run(&mut self) {
        while self.run_once(None) {}
    }

    /// Applies everything already queued, then fires due timers. Never blocks.
    pub fn process_pending(&mut self, now: Instant) {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.handle_event(event, now),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if !self.stopped {
            self.transport.poll_timers(now);
        }
    }

    pub fn handle_event(&mut self, event: SessionEvent, now: Instant) {
        match event {
            SessionEvent::Connection(event) => {
                match self.transport.handle_event(event, now) {
                    Some(TransportOutput::Inbound(text)) => {
                        self.shell.on_inbound(&text, &mut self.terminal);
                    }
                    Some(TransportOutput::StateChanged(state)) => {
                        debug!(%state, "connection state changed");
                        self.shell.on_connection_state(state);
                    }
                    None => {}
                }
            }
            SessionEvent::Command(command) => self.handle_command(command),
        }
    }

    /// Tears the session down. Idempotent.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.transport.close();
        info!("session runtime stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Run => {
                if let Err(error) = self.shell.run(&mut self.transport, &mut self.terminal) {
                    warn!(error = %error, "run command failed");
                }
            }
            Command::Input(text) => self.shell.send_input(&text, &mut self.transport),
            Command::Stop => self.stop(),
        }
    }
}

impl<T: TerminalSurface> Drop for SessionRuntime<T> {
    fn drop(&mut self) {
        self.stop();
    }
}
