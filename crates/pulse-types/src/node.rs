use crate::{OFFLINE_THRESHOLD_SECS, ONLINE_THRESHOLD_SECS};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable name of a fleet member.
///
/// `Reported` carries the public key the node announced about itself.
/// `Derived` is synthesized from the node's address when no key was
/// reported; it is only as stable as the address, so consumers that need
/// a trusted identity should check [`NodeIdentity::is_reported`].
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeIdentity {
    Reported(String),
    Derived(String),
}

impl NodeIdentity {
    pub fn as_str(&self) -> &str {
        match self {
            NodeIdentity::Reported(key) | NodeIdentity::Derived(key) => key,
        }
    }

    pub fn is_reported(&self) -> bool {
        matches!(self, NodeIdentity::Reported(_))
    }
}

impl fmt::Debug for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeIdentity::Reported(key) => write!(f, "Reported({})", key),
            NodeIdentity::Derived(key) => write!(f, "Derived({})", key),
        }
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LivenessState {
    Online,
    Syncing,
    Offline,
}

impl LivenessState {
    /// Classify by seconds elapsed since the node was last heard from.
    /// Negative values (clock skew) count as fresh contact.
    pub fn classify(elapsed_secs: i64) -> Self {
        if elapsed_secs < ONLINE_THRESHOLD_SECS {
            LivenessState::Online
        } else if elapsed_secs < OFFLINE_THRESHOLD_SECS {
            LivenessState::Syncing
        } else {
            LivenessState::Offline
        }
    }

    pub fn at(last_contact: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self::classify((now - last_contact).num_seconds())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LivenessState::Online => "online",
            LivenessState::Syncing => "syncing",
            LivenessState::Offline => "offline",
        }
    }
}

impl fmt::Display for LivenessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state of one fleet member, rebuilt from scratch every sync cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub identity: NodeIdentity,
    pub node_id: Option<String>,
    pub gossip_address: String,
    pub rpc_address: String,
    pub software_version: String,
    pub liveness: LivenessState,
    pub is_public: bool,
    pub region: Option<String>,
    pub last_contact: DateTime<Utc>,

    pub storage_committed_bytes: u64,
    pub storage_used_bytes: u64,
    pub storage_usage_percent: f64,
    pub uptime_seconds: u64,

    pub cpu_percent: Option<f64>,
    pub ram_used_bytes: Option<u64>,
    pub ram_total_bytes: Option<u64>,
    pub packets_received: Option<u64>,
    pub packets_sent: Option<u64>,
    pub active_streams: Option<u64>,

    pub total_bytes: Option<u64>,
    pub total_pages: Option<u64>,
    pub file_size_bytes: Option<u64>,
    pub metadata_updated_at: Option<DateTime<Utc>>,

    pub credits: Option<f64>,
}

impl NodeRecord {
    pub fn key(&self) -> &str {
        self.identity.as_str()
    }

    pub fn is_online(&self) -> bool {
        self.liveness == LivenessState::Online
    }

    /// RAM usage as a percentage, when both sides are reported and non-zero.
    pub fn ram_usage_percent(&self) -> Option<f64> {
        match (self.ram_used_bytes, self.ram_total_bytes) {
            (Some(used), Some(total)) if used > 0 && total > 0 => {
                Some(used as f64 / total as f64 * 100.0)
            }
            _ => None,
        }
    }
}
