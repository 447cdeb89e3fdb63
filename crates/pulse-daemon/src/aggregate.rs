//! Network-wide statistics over one fleet read.

use chrono::{DateTime, Utc};
use pulse_types::{NetworkSnapshot, NodeRecord, UNKNOWN_VERSION};

/// Compute the snapshot for `nodes` as of `taken_at`.
///
/// Averages ignore nodes that do not report the underlying field, except
/// uptime, which is averaged over the whole fleet. An empty fleet yields
/// zero averages and absent optional aggregates.
pub fn aggregate(nodes: &[NodeRecord], taken_at: DateTime<Utc>) -> NetworkSnapshot {
    let total_nodes = nodes.len() as u64;
    let online_nodes = nodes.iter().filter(|n| n.is_online()).count() as u64;

    let total_storage_committed_bytes = nodes.iter().map(|n| n.storage_committed_bytes).sum();
    let total_storage_used_bytes = nodes.iter().map(|n| n.storage_used_bytes).sum();

    let avg_storage_usage_percent = mean(
        nodes
            .iter()
            .map(|n| n.storage_usage_percent)
            .filter(|p| *p > 0.0),
    )
    .map(round2)
    .unwrap_or(0.0);

    let avg_uptime_seconds = if nodes.is_empty() {
        0
    } else {
        let total: u128 = nodes.iter().map(|n| n.uptime_seconds as u128).sum();
        (total as f64 / nodes.len() as f64).round() as u64
    };

    let avg_cpu_percent = mean(nodes.iter().filter_map(|n| n.cpu_percent)).map(round2);
    let avg_ram_usage_percent = mean(nodes.iter().filter_map(|n| n.ram_usage_percent())).map(round2);

    let streams: u64 = nodes.iter().filter_map(|n| n.active_streams).sum();
    let total_active_streams = (streams > 0).then_some(streams);

    let total_credits = nodes
        .iter()
        .filter_map(|n| n.credits)
        .fold(None, |acc: Option<f64>, c| Some(acc.unwrap_or(0.0) + c));

    let network_version = nodes
        .first()
        .map(|n| n.software_version.clone())
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string());

    NetworkSnapshot {
        taken_at,
        total_nodes,
        online_nodes,
        total_storage_committed_bytes,
        total_storage_used_bytes,
        avg_storage_usage_percent,
        avg_uptime_seconds,
        avg_cpu_percent,
        avg_ram_usage_percent,
        total_active_streams,
        total_credits,
        network_version,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
