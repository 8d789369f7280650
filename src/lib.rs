//! Editor-shell core for running programs on a remote executor.
//!
//! Invariant: a single owner ([`runtime::SessionRuntime`]) processes transport
//! events, timers, and user commands, one at a time.
//!
//! # Public API Overview
//! - Edit an in-memory project through [`EditorShell`].
//! - Submit the active document and forward input with [`ExecutionController`].
//! - Drive the session from a serial loop with [`SessionRuntime`] and post
//!   commands from other threads through [`RuntimeHandle`].
//! - Plug in the terminal and download collaborators via [`TerminalSurface`]
//!   and [`FileSaver`].

pub mod config;
pub mod controller;
pub mod logging;
pub mod runtime;
pub mod shell;
pub mod surface;

pub use crate::config::{ConfigError, EnvConfig};
pub use crate::controller::{
    ExecutionController, MessageSink, ProgramState, RunError, NOT_CONNECTED_MESSAGE,
};
pub use crate::runtime::{Command, RunOutcome, RuntimeHandle, SessionEvent, SessionRuntime};
pub use crate::shell::{EditorShell, SaveOutcome, CREATED_AND_SAVED_MESSAGE, SAVED_MESSAGE};
pub use crate::surface::{
    error_line, success_line, DirectorySaver, EditorView, FileSaver, StdoutTerminal,
    TerminalSurface,
};
