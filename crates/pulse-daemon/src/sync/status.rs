use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Process-local view of the sync cycle. Readers always get a copy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncCycleStatus {
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Advisory; set by whoever arms the next timer tick.
    pub next_sync_at: Option<DateTime<Utc>>,
    pub nodes_synced: usize,
    /// Messages recorded by the most recent cycle.
    pub errors: Vec<String>,
    pub is_running: bool,
    pub last_duration_ms: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub rpc_reachable: bool,
    pub store_reachable: bool,
    pub reason: Option<String>,
}
