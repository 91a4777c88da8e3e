// Herald Infrastructure - State File Adapter
// Implements: StateStore

pub mod state_store;
pub mod zjson;

pub use state_store::{FileStateStore, PANICKED_STATE_FILE, STATE_FILE};
