//! Shapes returned by the fleet RPC methods and the credits feed.
//!
//! Every field is optional on the wire. Nodes running older software omit
//! the enriched stats entirely, so decoding never fails on a missing key.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// One peer entry. Numeric fields accept any JSON number or numeric
/// string; a value that does not fit the field reads as absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pod {
    pub id: Option<String>,
    pub address: Option<String>,
    pub version: Option<String>,
    pub last_seen: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub last_seen_timestamp: Option<f64>,
    pub pubkey: Option<String>,
    #[serde(deserialize_with = "lenient_u64")]
    pub storage_used: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub storage_committed: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub uptime: Option<u64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub storage_usage_percent: Option<f64>,
    #[serde(deserialize_with = "lenient_u16")]
    pub rpc_port: Option<u16>,
    pub is_public: Option<bool>,

    #[serde(deserialize_with = "lenient_f64")]
    pub cpu_percent: Option<f64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub ram_used: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub ram_total: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub packets_received: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub packets_sent: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub active_streams: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub total_bytes: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub total_pages: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub file_size: Option<u64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub metadata_last_updated: Option<f64>,
}

impl Pod {
    /// Reported public key, ignoring blank strings.
    pub fn reported_key(&self) -> Option<&str> {
        self.pubkey.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn address_str(&self) -> &str {
        self.address.as_deref().unwrap_or_default()
    }

    /// Fill every field this entry leaves out from `other`.
    pub fn merged_with(mut self, other: &Pod) -> Pod {
        macro_rules! fill {
            ($($field:ident),* $(,)?) => {
                $(
                    if self.$field.is_none() {
                        self.$field = other.$field.clone();
                    }
                )*
            };
        }

        fill!(
            id,
            address,
            version,
            last_seen,
            last_seen_timestamp,
            pubkey,
            storage_used,
            storage_committed,
            uptime,
            storage_usage_percent,
            rpc_port,
            is_public,
            cpu_percent,
            ram_used,
            ram_total,
            packets_received,
            packets_sent,
            active_streams,
            total_bytes,
            total_pages,
            file_size,
            metadata_last_updated,
        );
        self
    }
}

/// Entries stay raw until [`PodsResponse::into_pods`] so that one
/// malformed peer cannot fail the whole list.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PodsResponse {
    pub pods: Vec<Value>,
    #[serde(deserialize_with = "lenient_u64")]
    pub total_count: Option<u64>,
}

impl PodsResponse {
    /// Decode every entry on its own. Returns the pods that decoded and
    /// the number skipped.
    pub fn into_pods(self, method: &str) -> (Vec<Pod>, usize) {
        let mut skipped = 0;
        let pods = self
            .pods
            .into_iter()
            .enumerate()
            .filter_map(|(idx, entry)| match serde_json::from_value::<Pod>(entry) {
                Ok(pod) => Some(pod),
                Err(e) => {
                    warn!("Skipping malformed {} entry #{}: {}", method, idx, e);
                    skipped += 1;
                    None
                }
            })
            .collect();
        (pods, skipped)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct VersionResponse {
    pub version: Option<String>,
}

/// Node-local figures returned by the stats query of whichever endpoint
/// answered. Kept for diagnostics only.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalStats {
    pub metadata: StatsMetadata,
    pub stats: StatsCounters,
    pub file_size: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsMetadata {
    pub total_bytes: Option<u64>,
    pub total_pages: Option<u64>,
    pub last_updated: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsCounters {
    pub cpu_percent: Option<f64>,
    pub ram_used: Option<u64>,
    pub ram_total: Option<u64>,
    pub uptime: Option<u64>,
    pub packets_received: Option<u64>,
    pub packets_sent: Option<u64>,
    pub active_streams: Option<u64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreditsResponse {
    pub status: Option<String>,
    pub pods_credits: Vec<PodCredit>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PodCredit {
    pub pod_id: String,
    pub credits: f64,
}

fn as_f64(value: &Value) -> Option<f64> {
    let n: f64 = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn as_u64(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    if let Value::String(s) = value {
        if let Ok(n) = s.trim().parse::<u64>() {
            return Some(n);
        }
    }
    // Fractions truncate, oversized values saturate, negatives are unknown.
    as_f64(value)
        .filter(|n| *n >= 0.0)
        .map(|n| n.trunc() as u64)
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.as_ref().and_then(as_f64))
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.as_ref().and_then(as_u64))
}

fn lenient_u16<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u16>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(as_u64)
        .and_then(|n| u16::try_from(n).ok()))
}
