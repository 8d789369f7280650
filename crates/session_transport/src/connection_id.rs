use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ConnectionIdError;

pub const CONNECTION_FILE_NAME: &str = "connection.json";

/// Correlation id the backend uses to recognize a reconnecting client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionRecord {
    pub connection_id: String,
    pub created_at: String,
}

impl ConnectionRecord {
    pub fn generate() -> Result<Self, ConnectionIdError> {
        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(ConnectionIdError::ClockFormat)?;
        Ok(Self {
            connection_id: Uuid::new_v4().to_string(),
            created_at,
        })
    }
}

/// Persists the connection id in a state directory so it survives restarts.
#[derive(Debug, Clone)]
pub struct ConnectionIdStore {
    path: PathBuf,
}

impl ConnectionIdStore {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join(CONNECTION_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored record. A missing file is not an error.
    pub fn load(&self) -> Result<Option<ConnectionRecord>, ConnectionIdError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(ConnectionIdError::io("reading", &self.path, error)),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| ConnectionIdError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    /// Returns the stored record, creating one when none exists or the id is blank.
    pub fn load_or_create(&self) -> Result<ConnectionRecord, ConnectionIdError> {
        if let Some(record) = self.load()? {
            if !record.connection_id.trim().is_empty() {
                debug!(path = %self.path.display(), "reusing stored connection id");
                return Ok(record);
            }
        }

        let record = ConnectionRecord::generate()?;
        self.write(&record)?;
        info!(
            path = %self.path.display(),
            connection_id = %record.connection_id,
            "created connection id"
        );
        Ok(record)
    }

    /// Forgets the stored id; the next [`ConnectionIdStore::load_or_create`] mints a new one.
    pub fn reset(&self) -> Result<(), ConnectionIdError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(ConnectionIdError::io("removing", &self.path, error)),
        }
    }

    fn write(&self, record: &ConnectionRecord) -> Result<(), ConnectionIdError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|error| ConnectionIdError::io("creating directory", parent, error))?;
        }

        let mut body =
            serde_json::to_string_pretty(record).map_err(|source| ConnectionIdError::Serialize {
                path: self.path.clone(),
                source,
            })?;
        body.push('\n');
        fs::write(&self.path, body).map_err(|error| ConnectionIdError::io("writing", &self.path, error))
    }
}
