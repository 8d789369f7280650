#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use executor_protocol::ClientMessage;
use runpad::{FileSaver, MessageSink, TerminalSurface};
use session_transport::{
    Connection, ConnectionState, Connector, EventSink, TransportError,
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TerminalTrace {
    pub writes: Vec<String>,
    pub clears: usize,
    pub focuses: usize,
    pub scrolls: usize,
}

impl TerminalTrace {
    pub fn output(&self) -> String {
        self.writes.join("")
    }
}

#[derive(Debug, Default)]
pub struct RecordingTerminal {
    pub trace: TerminalTrace,
}

impl TerminalSurface for RecordingTerminal {
    fn write(&mut self, text: &str) {
        self.trace.writes.push(text.to_string());
    }

    fn clear(&mut self) {
        self.trace.clears += 1;
        self.trace.writes.clear();
    }

    fn focus(&mut self) {
        self.trace.focuses += 1;
    }

    fn scroll_to_bottom(&mut self) {
        self.trace.scrolls += 1;
    }
}

/// Message sink with a switchable connection and an optional send failure.
#[derive(Debug)]
pub struct RecordingSink {
    pub open: bool,
    pub fail_with: Option<String>,
    pub sent: Vec<ClientMessage>,
}

impl RecordingSink {
    pub fn open() -> Self {
        Self {
            open: true,
            fail_with: None,
            sent: Vec::new(),
        }
    }

    pub fn closed() -> Self {
        Self {
            open: false,
            ..Self::open()
        }
    }
}

impl MessageSink for RecordingSink {
    fn is_open(&self) -> bool {
        self.open
    }

    fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::NotConnected {
                state: ConnectionState::Disconnected,
            });
        }
        if let Some(reason) = &self.fail_with {
            return Err(TransportError::Send {
                reason: reason.clone(),
            });
        }
        self.sent.push(message.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingSaver {
    pub saved: Vec<(String, String)>,
    pub fail: bool,
}

impl FileSaver for RecordingSaver {
    fn save(&mut self, file_name: &str, content: &str) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        self.saved.push((file_name.to_string(), content.to_string()));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ConnectorTrace {
    pub sinks: Vec<EventSink>,
    pub sent: Vec<String>,
    pub closed: usize,
}

impl ConnectorTrace {
    pub fn latest_sink(&self) -> EventSink {
        match self.sinks.last() {
            Some(sink) => sink.clone(),
            None => panic!("no connection attempt recorded"),
        }
    }
}

pub struct FakeConnector {
    state: Arc<Mutex<ConnectorTrace>>,
}

impl FakeConnector {
    pub fn new() -> (Self, Arc<Mutex<ConnectorTrace>>) {
        let state = Arc::new(Mutex::new(ConnectorTrace::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            state,
        )
    }
}

impl Connector for FakeConnector {
    fn connect(
        &mut self,
        _url: &str,
        events: EventSink,
    ) -> Result<Box<dyn Connection>, TransportError> {
        lock_unpoisoned(&self.state).sinks.push(events);
        Ok(Box::new(FakeConnection {
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeConnection {
    state: Arc<Mutex<ConnectorTrace>>,
}

impl Connection for FakeConnection {
    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        lock_unpoisoned(&self.state).sent.push(text.to_string());
        Ok(())
    }

    fn close(&mut self) {
        lock_unpoisoned(&self.state).closed += 1;
    }
}

pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
