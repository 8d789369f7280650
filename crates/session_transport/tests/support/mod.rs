#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use session_transport::{
    Connection, ConnectionEvent, Connector, EventSink, ReconnectPolicy, SessionTransport,
    TransportConfig, TransportError,
};

#[derive(Debug, Default)]
pub struct ConnectorTrace {
    pub urls: Vec<String>,
    pub sinks: Vec<EventSink>,
    /// Text sent through each connection, by connect order.
    pub sent: Vec<Vec<String>>,
    pub closed: Vec<bool>,
    pub fail_connects: bool,
}

impl ConnectorTrace {
    pub fn connects(&self) -> usize {
        self.urls.len()
    }

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
        url: &str,
        events: EventSink,
    ) -> Result<Box<dyn Connection>, TransportError> {
        let mut state = lock_unpoisoned(&self.state);
        state.urls.push(url.to_string());
        state.sinks.push(events);
        if state.fail_connects {
            return Err(TransportError::Connect {
                url: url.to_string(),
                reason: "refused".to_string(),
            });
        }

        let index = state.sent.len();
        state.sent.push(Vec::new());
        state.closed.push(false);
        Ok(Box::new(FakeConnection {
            index,
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeConnection {
    index: usize,
    state: Arc<Mutex<ConnectorTrace>>,
}

impl Connection for FakeConnection {
    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        lock_unpoisoned(&self.state).sent[self.index].push(text.to_string());
        Ok(())
    }

    fn close(&mut self) {
        lock_unpoisoned(&self.state).closed[self.index] = true;
    }
}

/// Transport wired to a fake connector; events land in the returned queue.
pub struct Harness {
    pub transport: SessionTransport,
    pub connector: Arc<Mutex<ConnectorTrace>>,
    pub events: Arc<Mutex<Vec<ConnectionEvent>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(ReconnectPolicy::default())
    }

    pub fn with_policy(policy: ReconnectPolicy) -> Self {
        let (connector, trace) = FakeConnector::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let queue = Arc::clone(&events);
        let sink = EventSink::new(move |event| lock_unpoisoned(&queue).push(event));
        let config = TransportConfig::new("http://127.0.0.1:8000", "1700000000000").with_policy(policy);
        let transport = SessionTransport::new(config, connector, sink).expect("valid config");

        Self {
            transport,
            connector: trace,
            events,
        }
    }

    pub fn connects(&self) -> usize {
        lock_unpoisoned(&self.connector).connects()
    }

    pub fn latest_sink(&self) -> EventSink {
        lock_unpoisoned(&self.connector).latest_sink()
    }

    pub fn take_events(&self) -> Vec<ConnectionEvent> {
        std::mem::take(&mut *lock_unpoisoned(&self.events))
    }
}

pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
