use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const FLUSH_INTERVAL_MS: u64 = 1_000;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Relative paths resolve against the data directory.
    pub path: PathBuf,
    pub cache_capacity_bytes: u64,
    pub flush_every_ms: Option<u64>,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("fleet"),
            cache_capacity_bytes: 64 * 1024 * 1024,
            flush_every_ms: Some(FLUSH_INTERVAL_MS),
        }
    }
}
