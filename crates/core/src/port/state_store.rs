// State Store Port
// Load once before the pipeline starts, store once after it stops.

use crate::domain::BotState;
use thiserror::Error;

/// Persistence errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("State not found: {0}")]
    NotFound(String),

    #[error("Corrupt state in {path}: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistent storage for [`BotState`]
pub trait StateStore: Send + Sync {
    fn load(&self) -> Result<BotState, StoreError>;

    fn store(&self, state: &BotState) -> Result<(), StoreError>;

    /// Keep a copy aside after a crash so an operator can restore it by hand
    fn store_panicked(&self, state: &BotState) -> Result<(), StoreError>;
}
