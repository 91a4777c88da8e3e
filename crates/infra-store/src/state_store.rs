// File-backed StateStore

use crate::zjson::{self, ZjsonError};
use herald_core::domain::BotState;
use herald_core::port::{StateStore, StoreError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

/// State file name inside the root directory
pub const STATE_FILE: &str = "bot_state.zz";

/// Crash snapshot file name inside the root directory
pub const PANICKED_STATE_FILE: &str = "bot_state.panicked.zz";

/// Stores [`BotState`] as zlib-compressed JSON under a root directory
pub struct FileStateStore {
    root: PathBuf,
}

impl FileStateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join(STATE_FILE)
    }

    pub fn panicked_path(&self) -> PathBuf {
        self.root.join(PANICKED_STATE_FILE)
    }

    fn write(&self, path: &Path, state: &BotState) -> Result<(), StoreError> {
        zjson::store(path, state).map_err(|e| to_store_error(path, e))?;
        info!(path = %path.display(), "State stored");
        Ok(())
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> Result<BotState, StoreError> {
        let path = self.state_path();
        let mut state: BotState = zjson::load(&path).map_err(|e| to_store_error(&path, e))?;
        state.global_config.root = self.root.clone();
        info!(path = %path.display(), "State loaded");
        Ok(state)
    }

    fn store(&self, state: &BotState) -> Result<(), StoreError> {
        self.write(&self.state_path(), state)
    }

    fn store_panicked(&self, state: &BotState) -> Result<(), StoreError> {
        self.write(&self.panicked_path(), state)
    }
}

fn to_store_error(path: &Path, err: ZjsonError) -> StoreError {
    match err {
        ZjsonError::Open { source, .. } if source.kind() == ErrorKind::NotFound => {
            StoreError::NotFound(path.display().to_string())
        }
        ZjsonError::Open { source, .. } => StoreError::Io(source),
        ZjsonError::Io(e)
            if e.kind() == ErrorKind::InvalidInput || e.kind() == ErrorKind::InvalidData =>
        {
            StoreError::Corrupt {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        }
        ZjsonError::Io(e) => StoreError::Io(e),
        ZjsonError::Json(e) => StoreError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        },
    }
}
