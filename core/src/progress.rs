use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ProgressError;
use crate::types::LevelKey;

/// Set of completed (world, level) pairs.
pub trait ProgressStore {
    fn mark_completed(&mut self, world: i32, level: i32);
    fn is_completed(&self, world: i32, level: i32) -> bool;
    fn completed_count(&self) -> usize;
}

/// Process-local store; nothing survives a restart.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryProgress {
    completed: BTreeSet<LevelKey>,
}

impl MemoryProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryProgress {
    fn mark_completed(&mut self, world: i32, level: i32) {
        self.completed.insert(LevelKey::new(world, level));
    }

    fn is_completed(&self, world: i32, level: i32) -> bool {
        self.completed.contains(&LevelKey::new(world, level))
    }

    fn completed_count(&self) -> usize {
        self.completed.len()
    }
}

/// On-disk layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressFile {
    completed: Vec<LevelKey>,
}

/// JSON-file store. Persists after every newly completed level; write
/// failures are logged and the in-memory set stays authoritative.
#[derive(Clone, Debug)]
pub struct JsonFileProgress {
    path: PathBuf,
    completed: BTreeSet<LevelKey>,
}

impl JsonFileProgress {
    /// A missing file yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProgressError> {
        let path = path.as_ref().to_path_buf();
        let completed = if path.exists() {
            let text = fs::read_to_string(&path)?;
            let file: ProgressFile = serde_json::from_str(&text)?;
            file.completed.into_iter().collect()
        } else {
            BTreeSet::new()
        };
        debug!(path = %path.display(), count = completed.len(), "progress loaded");
        Ok(JsonFileProgress { path, completed })
    }

    pub fn save(&self) -> Result<(), ProgressError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let file = ProgressFile {
            completed: self.completed.iter().copied().collect(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}

impl ProgressStore for JsonFileProgress {
    fn mark_completed(&mut self, world: i32, level: i32) {
        if self.completed.insert(LevelKey::new(world, level)) {
            if let Err(err) = self.save() {
                warn!(path = %self.path.display(), %err, "could not persist progress");
            }
        }
    }

    fn is_completed(&self, world: i32, level: i32) -> bool {
        self.completed.contains(&LevelKey::new(world, level))
    }

    fn completed_count(&self) -> usize {
        self.completed.len()
    }
}
