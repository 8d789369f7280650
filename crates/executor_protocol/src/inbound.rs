use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Text the executor emits once the submitted program has terminated.
pub const PROCESS_EXIT_MARKER: &str = "** Process exited";
/// Text that indicates the program is waiting on stdin.
pub const INPUT_PROMPT_MARKER: &str = "Enter";

fn lifecycle_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"Connected to server|Connection error|Connection closed|Attempting to reconnect")
            .expect("lifecycle regex must compile")
    })
}

/// What an inbound chunk means for the running program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InboundSignal {
    #[default]
    None,
    /// The program is waiting on stdin; the terminal should take focus.
    Prompt,
    /// The program terminated.
    Exited,
}

/// Normalized inbound event.
///
/// Whether the text is shown and what it signals are decided independently,
/// so a hidden chunk can still carry the exit marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub text: String,
    /// Connection chatter that is never shown to the user.
    pub hidden: bool,
    pub signal: InboundSignal,
}

impl InboundEvent {
    pub fn output(text: impl Into<String>) -> Self {
        Self::shown(text, InboundSignal::None)
    }

    pub fn prompt(text: impl Into<String>) -> Self {
        Self::shown(text, InboundSignal::Prompt)
    }

    pub fn exited(text: impl Into<String>) -> Self {
        Self::shown(text, InboundSignal::Exited)
    }

    pub fn lifecycle(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hidden: true,
            signal: InboundSignal::None,
        }
    }

    fn shown(text: impl Into<String>, signal: InboundSignal) -> Self {
        Self {
            text: text.into(),
            hidden: false,
            signal,
        }
    }

    /// Text to forward to the terminal surface, `None` when suppressed.
    pub fn display_text(&self) -> Option<&str> {
        (!self.hidden).then_some(self.text.as_str())
    }

    pub fn is_exit(&self) -> bool {
        self.signal == InboundSignal::Exited
    }

    pub fn is_prompt(&self) -> bool {
        self.signal == InboundSignal::Prompt
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    Stdout,
    Prompt,
    Exit,
    Lifecycle,
}

/// Explicitly tagged inbound frame: `{"kind": "...", "payload": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundFrame {
    pub kind: FrameKind,
    #[serde(default)]
    pub payload: String,
}

impl From<InboundFrame> for InboundEvent {
    fn from(frame: InboundFrame) -> Self {
        let text = frame.payload;
        match frame.kind {
            FrameKind::Stdout => Self::output(text),
            FrameKind::Prompt => Self::prompt(text),
            FrameKind::Exit => Self::exited(text),
            FrameKind::Lifecycle => Self::lifecycle(text),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProtocolMode {
    /// Plain text classified by marker substrings.
    #[default]
    Legacy,
    /// Tagged JSON frames, with plain-text fallback for untagged chunks.
    Tagged,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InboundDecoder {
    mode: ProtocolMode,
}

impl InboundDecoder {
    pub fn new(mode: ProtocolMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ProtocolMode {
        self.mode
    }

    pub fn decode(&self, text: &str) -> InboundEvent {
        match self.mode {
            ProtocolMode::Legacy => classify_legacy(text),
            ProtocolMode::Tagged => decode_tagged(text).unwrap_or_else(|| classify_legacy(text)),
        }
    }
}

/// Substring classification of an untagged chunk.
///
/// A lifecycle phrase hides the chunk. Independently, the exit marker wins
/// over the prompt marker. Any program that prints one of these phrases is
/// misclassified.
pub fn classify_legacy(text: &str) -> InboundEvent {
    let signal = if text.contains(PROCESS_EXIT_MARKER) {
        InboundSignal::Exited
    } else if text.contains(INPUT_PROMPT_MARKER) {
        InboundSignal::Prompt
    } else {
        InboundSignal::None
    };

    InboundEvent {
        text: text.to_owned(),
        hidden: lifecycle_regex().is_match(text),
        signal,
    }
}

fn decode_tagged(text: &str) -> Option<InboundEvent> {
    if !text.trim_start().starts_with('{') {
        return None;
    }
    serde_json::from_str::<InboundFrame>(text)
        .ok()
        .map(InboundEvent::from)
}
