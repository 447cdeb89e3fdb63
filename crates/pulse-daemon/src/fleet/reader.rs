use super::credits::{CreditsFeed, CreditsMap};
use super::normalize::{normalize, NormalizeContext};
use super::wire::{GlobalStats, Pod, PodsResponse, VersionResponse};
use crate::config::RpcMethods;
use crate::rpc::EndpointGateway;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_types::{NodeRecord, PulseResult, UNKNOWN_VERSION};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One deduplicated, classified view of the fleet.
#[derive(Clone, Debug, Default)]
pub struct FleetRead {
    pub nodes: Vec<NodeRecord>,
    /// Entries returned by the enriched peer list before deduplication.
    pub raw_count: usize,
    pub duplicates_dropped: usize,
    /// Peer entries skipped because they could not be decoded.
    pub malformed_dropped: usize,
    pub global_stats: Option<GlobalStats>,
    pub version: String,
}

impl FleetRead {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[async_trait]
pub trait FleetSource: Send + Sync {
    /// Read the whole fleet. Any failed fleet query fails the read.
    async fn fetch_fleet(&self) -> PulseResult<FleetRead>;

    /// Whether at least one RPC endpoint answers.
    async fn reachable(&self) -> bool;
}

pub struct FleetReader {
    gateway: Arc<EndpointGateway>,
    credits: Arc<dyn CreditsFeed>,
    methods: RpcMethods,
}

impl FleetReader {
    pub fn new(gateway: Arc<EndpointGateway>, credits: Arc<dyn CreditsFeed>, methods: RpcMethods) -> Self {
        Self {
            gateway,
            credits,
            methods,
        }
    }
}

#[async_trait]
impl FleetSource for FleetReader {
    async fn fetch_fleet(&self) -> PulseResult<FleetRead> {
        info!("Fetching fleet from {}", self.gateway.current_endpoint());

        let queries = async {
            futures::try_join!(
                self.gateway.call::<VersionResponse>(&self.methods.version, Value::Null),
                self.gateway.call::<Value>(&self.methods.stats, Value::Null),
                self.gateway.call::<PodsResponse>(&self.methods.pods, Value::Null),
                self.gateway.call::<PodsResponse>(&self.methods.pods_with_stats, Value::Null),
            )
        };
        let (queries, credits) = futures::join!(queries, self.credits.fetch_credits());
        let (version, stats, basic, enriched) = queries?;

        let (basic, basic_skipped) = basic.into_pods(&self.methods.pods);
        let (enriched, enriched_skipped) = enriched.into_pods(&self.methods.pods_with_stats);
        let global_stats = decode_stats(stats);

        info!(
            basic = basic.len(),
            enriched = enriched.len(),
            malformed = basic_skipped + enriched_skipped,
            credits = credits.len(),
            endpoint = self.gateway.current_endpoint(),
            "Fetched fleet queries"
        );
        if let Some(stats) = &global_stats {
            debug!("Global stats: {:?}", stats);
        }

        let version = version
            .version
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string());

        let read = assemble_fleet(&version, basic, enriched, &credits, Utc::now());
        Ok(FleetRead {
            global_stats,
            malformed_dropped: basic_skipped + enriched_skipped,
            ..read
        })
    }

    async fn reachable(&self) -> bool {
        self.gateway.ping(&self.methods.version).await
    }
}

/// Stats are diagnostic only, so a shape mismatch is logged and dropped.
fn decode_stats(raw: Value) -> Option<GlobalStats> {
    if raw.is_null() {
        return None;
    }
    match serde_json::from_value(raw) {
        Ok(stats) => Some(stats),
        Err(e) => {
            warn!("Ignoring malformed global stats: {}", e);
            None
        }
    }
}

/// Merge the enriched and basic peer lists into one record per identity.
///
/// The enriched list is authoritative. A basic entry with the same key or
/// address only fills fields the enriched entry left out. The first record
/// seen for an identity wins.
pub fn assemble_fleet(
    version: &str,
    basic: Vec<Pod>,
    enriched: Vec<Pod>,
    credits: &CreditsMap,
    now: DateTime<Utc>,
) -> FleetRead {
    let mut by_key: HashMap<String, Pod> = HashMap::new();
    let mut by_address: HashMap<String, Pod> = HashMap::new();
    for pod in basic {
        if let Some(key) = pod.reported_key() {
            by_key.entry(key.to_string()).or_insert_with(|| pod.clone());
        }
        if let Some(address) = pod.address.clone() {
            by_address.entry(address).or_insert(pod);
        }
    }

    let ctx = NormalizeContext {
        now,
        network_version: version,
        credits,
    };

    let raw_count = enriched.len();
    let mut seen = HashSet::with_capacity(raw_count);
    let mut nodes = Vec::with_capacity(raw_count);

    for pod in enriched {
        let fallback = pod
            .reported_key()
            .and_then(|key| by_key.get(key))
            .or_else(|| pod.address.as_ref().and_then(|a| by_address.get(a)));

        let pod = match fallback {
            Some(basic) => pod.merged_with(basic),
            None => pod,
        };

        let record = normalize(&pod, &ctx);
        if seen.insert(record.key().to_string()) {
            nodes.push(record);
        } else {
            warn!(
                identity = record.key(),
                address = %record.gossip_address,
                "Duplicate identity detected, skipping"
            );
        }
    }

    let duplicates_dropped = raw_count - nodes.len();
    if duplicates_dropped > 0 {
        warn!("Removed {} duplicate nodes", duplicates_dropped);
    }
    info!("Processed {} unique nodes", nodes.len());

    FleetRead {
        nodes,
        raw_count,
        duplicates_dropped,
        malformed_dropped: 0,
        global_stats: None,
        version: version.to_string(),
    }
}
