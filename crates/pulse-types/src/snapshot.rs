use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Network-wide aggregate over one fleet read. Appended once per
/// successful sync cycle and never updated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub taken_at: DateTime<Utc>,
    pub total_nodes: u64,
    pub online_nodes: u64,
    pub total_storage_committed_bytes: u64,
    pub total_storage_used_bytes: u64,
    pub avg_storage_usage_percent: f64,
    pub avg_uptime_seconds: u64,
    pub avg_cpu_percent: Option<f64>,
    pub avg_ram_usage_percent: Option<f64>,
    pub total_active_streams: Option<u64>,
    pub total_credits: Option<f64>,
    pub network_version: String,
}

impl NetworkSnapshot {
    pub fn online_ratio(&self) -> f64 {
        if self.total_nodes == 0 {
            0.0
        } else {
            self.online_nodes as f64 / self.total_nodes as f64
        }
    }
}
