use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::PersistError;
use crate::games::kalah::GameRecord;

pub trait GamePersister {
    fn persist(&mut self, record: &GameRecord) -> Result<(), PersistError>;
}

pub trait GameRetriever {
    fn retrieve_by_id(&self, id: Uuid) -> Result<GameRecord, PersistError>;
}

// Append-only JSON lines file. Every save adds a line, the latest line for an
// id wins.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    path: PathBuf,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl GamePersister for JsonlStore {
    fn persist(&mut self, record: &GameRecord) -> Result<(), PersistError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        let mut writer = BufWriter::new(file);
        jsonl::write(&mut writer, record).map_err(|e| PersistError::Write(e.to_string()))?;
        writer.flush().map_err(|e| self.io_error(e))?;

        log::debug!("Saved game {} to {}", record.id, self.path.display());
        Ok(())
    }
}

impl GameRetriever for JsonlStore {
    fn retrieve_by_id(&self, id: Uuid) -> Result<GameRecord, PersistError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(PersistError::NotFound(id)),
            Err(e) => return Err(self.io_error(e)),
        };

        let mut found = None;
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| self.io_error(e))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: GameRecord = serde_json::from_str(&line).map_err(|source| PersistError::Parse {
                path: self.path.clone(),
                line: idx + 1,
                source,
            })?;
            if record.id == id {
                found = Some(record);
            }
        }

        found.ok_or(PersistError::NotFound(id))
    }
}
