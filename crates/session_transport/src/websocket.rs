use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use crate::connector::{Connection, Connector};
use crate::error::TransportError;
use crate::event::EventSink;

/// How long the socket worker blocks in a read before checking for outbound frames.
pub const DEFAULT_READ_POLL_INTERVAL: Duration = Duration::from_millis(50);

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

enum Outbound {
    Text(String),
    Close,
}

/// Blocking tungstenite client. Each connection runs on its own worker thread
/// and reports back through the [`EventSink`] it was handed.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    read_poll: Duration,
}

impl Default for WebSocketConnector {
    fn default() -> Self {
        Self {
            read_poll: DEFAULT_READ_POLL_INTERVAL,
        }
    }
}

impl WebSocketConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read_poll(mut self, read_poll: Duration) -> Self {
        self.read_poll = read_poll;
        self
    }
}

impl Connector for WebSocketConnector {
    fn connect(
        &mut self,
        url: &str,
        events: EventSink,
    ) -> Result<Box<dyn Connection>, TransportError> {
        let (outbound, inbound) = mpsc::channel();
        let closing = Arc::new(AtomicBool::new(false));
        let worker = SocketWorker {
            url: url.to_string(),
            read_poll: self.read_poll,
            events,
            outbound: inbound,
            closing: Arc::clone(&closing),
        };

        thread::Builder::new()
            .name(format!("runpad-socket-{}", worker.events.generation()))
            .spawn(move || worker.run())
            .map_err(|error| TransportError::Connect {
                url: url.to_string(),
                reason: format!("failed to spawn socket worker: {error}"),
            })?;

        Ok(Box::new(WebSocketConnection { outbound, closing }))
    }
}

struct WebSocketConnection {
    outbound: Sender<Outbound>,
    closing: Arc<AtomicBool>,
}

impl Connection for WebSocketConnection {
    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        if self.closing.load(Ordering::SeqCst) {
            return Err(TransportError::Send {
                reason: "connection is closing".to_string(),
            });
        }
        self.outbound
            .send(Outbound::Text(text.to_string()))
            .map_err(|_| TransportError::Send {
                reason: "socket worker has exited".to_string(),
            })
    }

    fn close(&mut self) {
        self.closing.store(true, Ordering::SeqCst);
        let _ = self.outbound.send(Outbound::Close);
    }
}

impl Drop for WebSocketConnection {
    fn drop(&mut self) {
        self.close();
    }
}

struct SocketWorker {
    url: String,
    read_poll: Duration,
    events: EventSink,
    outbound: Receiver<Outbound>,
    closing: Arc<AtomicBool>,
}

impl SocketWorker {
    fn run(self) {
        let mut socket = match tungstenite::connect(self.url.as_str()) {
            Ok((socket, _response)) => socket,
            Err(error) => {
                if !self.closing.load(Ordering::SeqCst) {
                    self.events.failed(error.to_string());
                    self.events.closed("connect failed");
                }
                return;
            }
        };

        if self.closing.load(Ordering::SeqCst) {
            let _ = socket.close(None);
            return;
        }

        match tcp_stream(&socket) {
            Some(stream) => {
                if let Err(error) = stream.set_read_timeout(Some(self.read_poll)) {
                    warn!(error = %error, "failed to set socket read timeout");
                }
            }
            None => warn!("unknown socket stream; reads will block"),
        }

        debug!(url = %self.url, generation = self.events.generation(), "socket open");
        self.events.opened();
        self.pump(&mut socket);
    }

    fn pump(&self, socket: &mut Socket) {
        loop {
            if !self.drain_outbound(socket) {
                return;
            }

            match socket.read() {
                Ok(Message::Text(text)) => self.events.message(text.to_string()),
                Ok(Message::Close(frame)) => {
                    let reason = frame
                        .map(|frame| frame.reason.to_string())
                        .unwrap_or_default();
                    self.events.closed(reason);
                    return;
                }
                Ok(_) => {}
                Err(tungstenite::Error::Io(error))
                    if matches!(error.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    self.events.closed("connection closed");
                    return;
                }
                Err(error) => {
                    self.events.failed(error.to_string());
                    self.events.closed("connection error");
                    return;
                }
            }
        }
    }

    /// Returns `false` once the worker should exit: the owner asked it to
    /// stop, or the socket can no longer be written.
    fn drain_outbound(&self, socket: &mut Socket) -> bool {
        loop {
            match self.outbound.try_recv() {
                Ok(Outbound::Text(text)) => {
                    if let Err(error) = socket.send(Message::text(text)) {
                        self.events.failed(error.to_string());
                        self.events.closed("send failed");
                        return false;
                    }
                }
                Ok(Outbound::Close) | Err(TryRecvError::Disconnected) => {
                    let _ = socket.close(None);
                    let _ = socket.flush();
                    return false;
                }
                Err(TryRecvError::Empty) => return true,
            }
        }
    }
}

fn tcp_stream(socket: &Socket) -> Option<&TcpStream> {
    match socket.get_ref() {
        MaybeTlsStream::Plain(stream) => Some(stream),
        MaybeTlsStream::Rustls(stream) => Some(&stream.sock),
        _ => None,
    }
}
