use super::credits::CreditsMap;
use super::wire::Pod;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use pulse_types::{LivenessState, NodeIdentity, NodeRecord, DEFAULT_GOSSIP_PORT, NODE_RPC_PORT};
use std::net::Ipv4Addr;

/// Length of a derived identity, matching the width of a base58 public key.
const DERIVED_IDENTITY_LEN: usize = 44;

/// Inputs shared by every entry normalized in one fleet read.
pub struct NormalizeContext<'a> {
    pub now: DateTime<Utc>,
    pub network_version: &'a str,
    pub credits: &'a CreditsMap,
}

/// Split `ip:port`. A missing or unparseable port becomes the default
/// gossip port.
pub fn split_address(address: &str) -> (&str, u16) {
    match address.rsplit_once(':') {
        Some((host, port)) => (host, port.trim().parse().unwrap_or(DEFAULT_GOSSIP_PORT)),
        None => (address, DEFAULT_GOSSIP_PORT),
    }
}

/// Stable identity for a peer that did not report a key. Only as stable as
/// the address: a node that moves shows up as a new fleet member.
pub fn derive_identity(address: &str) -> String {
    let hex = blake3::hash(address.as_bytes()).to_hex();
    hex.as_str()[..DERIVED_IDENTITY_LEN].to_string()
}

pub fn identity_for(pod: &Pod) -> NodeIdentity {
    match pod.reported_key() {
        Some(key) => NodeIdentity::Reported(key.to_string()),
        None => NodeIdentity::Derived(derive_identity(pod.address_str())),
    }
}

/// Reported epoch seconds, else the reported last-seen string, else `now`.
pub fn resolve_last_contact(pod: &Pod, now: DateTime<Utc>) -> DateTime<Utc> {
    if let Some(ts) = pod.last_seen_timestamp.and_then(epoch_to_time) {
        return ts;
    }

    pod.last_seen
        .as_deref()
        .and_then(|s| parse_last_seen(s, now))
        .unwrap_or(now)
}

fn epoch_to_time(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    Utc.timestamp_opt(secs.trunc() as i64, 0).single()
}

/// Accepts RFC 3339 timestamps and relative strings such as `"42 seconds ago"`.
fn parse_last_seen(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    let mut parts = raw.split_whitespace();
    let amount: i64 = parts.next()?.parse().ok()?;
    let unit = parts.next()?.trim_end_matches('s');
    if parts.next() != Some("ago") {
        return None;
    }

    let offset = match unit {
        "second" | "sec" => TimeDelta::try_seconds(amount),
        "minute" | "min" => TimeDelta::try_minutes(amount),
        "hour" => TimeDelta::try_hours(amount),
        "day" => TimeDelta::try_days(amount),
        _ => None,
    }?;
    now.checked_sub_signed(offset)
}

/// Liveness from the reported epoch timestamp alone. A peer that reported
/// none is classified as if last heard from at the epoch, i.e. offline.
pub fn liveness_for(pod: &Pod, now: DateTime<Utc>) -> LivenessState {
    let reported = pod
        .last_seen_timestamp
        .filter(|secs| secs.is_finite())
        .map(|secs| secs.trunc() as i64)
        .unwrap_or(0);
    LivenessState::classify(now.timestamp().saturating_sub(reported))
}

/// Coarse continental bucket from the first octet. Not a geolocation lookup.
pub fn region_for(host: &str) -> &'static str {
    let ip: Ipv4Addr = match host.parse() {
        Ok(ip) => ip,
        Err(_) => return "Unknown",
    };

    if ip.is_private() || ip.is_loopback() || ip.is_link_local() {
        return "Local";
    }

    match ip.octets()[0] {
        1..=126 => "North America",
        128..=191 => "Europe",
        192..=223 => "Asia Pacific",
        _ => "Unknown",
    }
}

/// Build the record for one (already merged) peer entry.
pub fn normalize(pod: &Pod, ctx: &NormalizeContext<'_>) -> NodeRecord {
    let (host, gossip_port) = split_address(pod.address_str());
    let identity = identity_for(pod);
    let last_contact = resolve_last_contact(pod, ctx.now);

    let storage_committed_bytes = pod.storage_committed.unwrap_or(0);
    let storage_used_bytes = pod.storage_used.unwrap_or(0);
    let storage_usage_percent = pod.storage_usage_percent.unwrap_or_else(|| {
        if storage_committed_bytes > 0 {
            storage_used_bytes as f64 / storage_committed_bytes as f64 * 100.0
        } else {
            0.0
        }
    });

    let credits = pod
        .id
        .as_deref()
        .and_then(|id| ctx.credits.get(id))
        .or_else(|| ctx.credits.get(identity.as_str()))
        .copied();

    NodeRecord {
        node_id: pod.id.clone(),
        gossip_address: format!("{}:{}", host, gossip_port),
        rpc_address: format!("{}:{}", host, NODE_RPC_PORT),
        software_version: pod
            .version
            .clone()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| ctx.network_version.to_string()),
        liveness: liveness_for(pod, ctx.now),
        is_public: pod.is_public.unwrap_or(false),
        region: Some(region_for(host).to_string()),
        last_contact,
        storage_committed_bytes,
        storage_used_bytes,
        storage_usage_percent,
        uptime_seconds: pod.uptime.unwrap_or(0),
        cpu_percent: pod.cpu_percent,
        ram_used_bytes: pod.ram_used,
        ram_total_bytes: pod.ram_total,
        packets_received: pod.packets_received,
        packets_sent: pod.packets_sent,
        active_streams: pod.active_streams,
        total_bytes: pod.total_bytes,
        total_pages: pod.total_pages,
        file_size_bytes: pod.file_size,
        metadata_updated_at: pod.metadata_last_updated.and_then(epoch_to_time),
        credits,
        identity,
    }
}
