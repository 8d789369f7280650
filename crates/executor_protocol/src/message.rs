use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Outbound request sent to the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start a program from the full document text.
    Execute { code: String, args: String },
    /// Raw keystroke or paste text for the running program's stdin.
    Input { input: String },
}

impl ClientMessage {
    /// Execute request with the (currently always empty) argument string.
    #[must_use]
    pub fn execute(code: impl Into<String>) -> Self {
        Self::Execute {
            code: code.into(),
            args: String::new(),
        }
    }

    #[must_use]
    pub fn input(input: impl Into<String>) -> Self {
        Self::Input {
            input: input.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Execute { .. } => "execute",
            Self::Input { .. } => "input",
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}
