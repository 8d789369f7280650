//! Seams to the collaborators the shell drives but does not own.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Terminal-like output the running program talks through.
pub trait TerminalSurface {
    fn write(&mut self, text: &str);
    fn clear(&mut self);
    fn focus(&mut self);
    fn scroll_to_bottom(&mut self);
}

/// Receives a saved document, e.g. as a download.
pub trait FileSaver {
    fn save(&mut self, file_name: &str, content: &str) -> io::Result<()>;
}

/// What the code editor should currently display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorView {
    pub content: String,
    pub language: &'static str,
    pub path: Vec<String>,
}

/// Formats a user-visible failure line.
pub fn error_line(message: &str) -> String {
    format!("\r\n{RED}{message}{RESET}\r\n")
}

/// Formats a user-visible success line.
pub fn success_line(message: &str) -> String {
    format!("\r\n{GREEN}{message}{RESET}\r\n")
}

/// Writes saved files into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSaver for DirectorySaver {
    fn save(&mut self, file_name: &str, content: &str) -> io::Result<()> {
        let Some(name) = Path::new(file_name).file_name() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid file name: {file_name:?}"),
            ));
        };
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        fs::write(&path, content)?;
        debug!(path = %path.display(), bytes = content.len(), "saved file");
        Ok(())
    }
}

/// Plain stdout terminal for the command-line front end.
#[derive(Debug)]
pub struct StdoutTerminal<W: Write> {
    out: W,
}

impl StdoutTerminal<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> StdoutTerminal<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TerminalSurface for StdoutTerminal<W> {
    fn write(&mut self, text: &str) {
        if let Err(error) = self.out.write_all(text.as_bytes()) {
            debug!(error = %error, "terminal write failed");
        }
    }

    fn clear(&mut self) {
        self.write("\x1b[2J\x1b[H");
    }

    fn focus(&mut self) {}

    fn scroll_to_bottom(&mut self) {
        if let Err(error) = self.out.flush() {
            debug!(error = %error, "terminal flush failed");
        }
    }
}
