//! Where finished replays go.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::error::ReplayError;
use crate::replay::GameRecord;

/// Fresh random replay identifier.
#[must_use]
pub fn new_replay_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Persistence for completed games.
pub trait ReplayStore: Send + Sync + fmt::Debug {
    /// Store a record, returning its new identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] if the record cannot be written.
    fn save(&self, record: &GameRecord) -> Result<String, ReplayError>;

    /// Fetch a stored record.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::NotFound`] for unknown ids, or another
    /// [`ReplayError`] if the stored data cannot be read.
    fn load(&self, id: &str) -> Result<GameRecord, ReplayError>;
}

/// One JSON file per replay, named `<id>.json`.
#[derive(Debug, Clone)]
pub struct FileReplayStore {
    dir: PathBuf,
}

impl FileReplayStore {
    /// Store replays under `dir`, created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory replays are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl ReplayStore for FileReplayStore {
    fn save(&self, record: &GameRecord) -> Result<String, ReplayError> {
        fs::create_dir_all(&self.dir)?;
        let id = new_replay_id();
        let path = self.path_for(&id);
        record.save_file(&path)?;
        debug!(replay = %id, path = %path.display(), "replay saved");
        Ok(id)
    }

    fn load(&self, id: &str) -> Result<GameRecord, ReplayError> {
        // Ids are bare hex; anything else could escape the directory.
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ReplayError::NotFound(id.to_string()));
        }
        match GameRecord::load_file(&self.path_for(id)) {
            Err(ReplayError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                Err(ReplayError::NotFound(id.to_string()))
            }
            other => other,
        }
    }
}

/// Keeps serialized replays in memory.
#[derive(Debug, Default)]
pub struct MemoryReplayStore {
    replays: Mutex<HashMap<String, String>>,
}

impl MemoryReplayStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored replays.
    #[must_use]
    pub fn len(&self) -> usize {
        self.replays.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReplayStore for MemoryReplayStore {
    fn save(&self, record: &GameRecord) -> Result<String, ReplayError> {
        let json = serde_json::to_string(record)?;
        let id = new_replay_id();
        self.replays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), json);
        Ok(id)
    }

    fn load(&self, id: &str) -> Result<GameRecord, ReplayError> {
        let replays = self.replays.lock().unwrap_or_else(PoisonError::into_inner);
        let json = replays
            .get(id)
            .ok_or_else(|| ReplayError::NotFound(id.to_string()))?;
        Ok(serde_json::from_str(json)?)
    }
}
