use std::fmt;
use std::sync::Arc;

/// Monotonic id of one connection attempt. Events tagged with a superseded
/// generation are ignored.
pub type Generation = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEventKind {
    Opened,
    Message(String),
    Closed { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEvent {
    pub generation: Generation,
    pub kind: ConnectionEventKind,
}

type Deliver = Arc<dyn Fn(ConnectionEvent) + Send + Sync>;

/// Posts connection events into the owner's serial event queue.
///
/// Connectors receive a sink already bound to the generation of the attempt
/// they are serving.
#[derive(Clone)]
pub struct EventSink {
    generation: Generation,
    deliver: Deliver,
}

impl EventSink {
    pub fn new(deliver: impl Fn(ConnectionEvent) + Send + Sync + 'static) -> Self {
        Self {
            generation: 0,
            deliver: Arc::new(deliver),
        }
    }

    pub(crate) fn for_generation(&self, generation: Generation) -> Self {
        Self {
            generation,
            deliver: Arc::clone(&self.deliver),
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn opened(&self) {
        self.emit(ConnectionEventKind::Opened);
    }

    pub fn message(&self, text: impl Into<String>) {
        self.emit(ConnectionEventKind::Message(text.into()));
    }

    pub fn closed(&self, reason: impl Into<String>) {
        self.emit(ConnectionEventKind::Closed {
            reason: reason.into(),
        });
    }

    pub fn failed(&self, error: impl Into<String>) {
        self.emit(ConnectionEventKind::Failed {
            error: error.into(),
        });
    }

    fn emit(&self, kind: ConnectionEventKind) {
        (self.deliver)(ConnectionEvent {
            generation: self.generation,
            kind,
        });
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
