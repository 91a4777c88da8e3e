// Persisted Bot State

use super::config::Config;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A media file already uploaded to the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaCacheEntry {
    pub path: String,
    pub file_id: String,
    pub checksum: String,
}

/// Upload cache keyed by local path. Carried in the state file, unused by dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaCache {
    #[serde(default)]
    pub entries: HashMap<String, MediaCacheEntry>,
}

/// Everything the daemon loads at startup and stores back at shutdown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotState {
    pub global_config: Config,
    #[serde(default)]
    pub media_cache: MediaCache,
}
