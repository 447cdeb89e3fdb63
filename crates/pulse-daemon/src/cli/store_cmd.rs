use super::commands::OutputFormat;
use super::utils::{dim, emit, load_config, print_header, print_warn};
use crate::storage::{FleetStore, SledFleetStore};
use pulse_types::{NetworkSnapshot, NodeRecord, PulseError, PulseResult};
use std::path::Path;

fn open_store(config_path: &Path, data_dir: Option<&Path>) -> PulseResult<SledFleetStore> {
    let config = load_config(config_path, data_dir)?;
    let path = config.storage_path();
    if !path.exists() {
        return Err(PulseError::Storage(format!(
            "No fleet store at {:?}; run 'pulse sync' or 'pulse run' first",
            path
        )));
    }
    // sled holds an exclusive lock, so this fails while the daemon runs.
    SledFleetStore::open(&path, &config.storage).map_err(|e| {
        PulseError::Storage(format!("{} (is the daemon running? use 'pulse status')", e))
    })
}

/// Online first, then by identity, truncated to `limit`.
pub fn select_nodes(mut nodes: Vec<NodeRecord>, online_only: bool, limit: usize) -> Vec<NodeRecord> {
    if online_only {
        nodes.retain(NodeRecord::is_online);
    }
    nodes.sort_by(|a, b| {
        b.is_online()
            .cmp(&a.is_online())
            .then_with(|| a.key().cmp(b.key()))
    });
    nodes.truncate(limit);
    nodes
}

pub async fn list_nodes(
    config_path: &Path,
    data_dir: Option<&Path>,
    limit: usize,
    online_only: bool,
    format: OutputFormat,
) -> PulseResult<()> {
    let store = open_store(config_path, data_dir)?;
    let total = store.node_count().await?;
    let nodes = select_nodes(store.list_nodes().await?, online_only, limit);

    emit(format, &nodes, || {
        print_header(&format!("Stored Nodes ({} of {})", nodes.len(), total));
        if nodes.is_empty() {
            print_warn("No nodes stored");
            return;
        }
        println!(
            "{:<46} {:<22} {:<8} {:<10} {:>8} {:>10}",
            "IDENTITY", "ADDRESS", "STATE", "VERSION", "USAGE%", "CREDITS"
        );
        for node in &nodes {
            println!(
                "{:<46} {:<22} {:<8} {:<10} {:>8.2} {:>10}",
                node.key(),
                node.gossip_address,
                node.liveness.as_str(),
                node.software_version,
                node.storage_usage_percent,
                node.credits.map(|c| format!("{:.0}", c)).unwrap_or_else(|| "-".into()),
            );
        }
    })
}

pub async fn show_snapshots(
    config_path: &Path,
    data_dir: Option<&Path>,
    count: usize,
    format: OutputFormat,
) -> PulseResult<()> {
    let store = open_store(config_path, data_dir)?;
    let snapshots = store.latest_snapshots(count).await?;

    emit(format, &snapshots, || {
        print_header("Network Snapshots");
        if snapshots.is_empty() {
            print_warn("No snapshots recorded");
            return;
        }
        for snapshot in &snapshots {
            print_snapshot(snapshot);
        }
    })
}

fn print_snapshot(snapshot: &NetworkSnapshot) {
    println!("{}", dim(snapshot.taken_at.to_rfc3339()));
    println!(
        "    Nodes:    {}/{} online ({:.1}%)",
        snapshot.online_nodes,
        snapshot.total_nodes,
        snapshot.online_ratio() * 100.0
    );
    println!(
        "    Storage:  {} / {} bytes ({:.2}%)",
        snapshot.total_storage_used_bytes,
        snapshot.total_storage_committed_bytes,
        snapshot.avg_storage_usage_percent
    );
    println!("    Uptime:   {}s avg", snapshot.avg_uptime_seconds);
    if let Some(cpu) = snapshot.avg_cpu_percent {
        println!("    CPU:      {:.2}% avg", cpu);
    }
    if let Some(ram) = snapshot.avg_ram_usage_percent {
        println!("    RAM:      {:.2}% avg", ram);
    }
    if let Some(streams) = snapshot.total_active_streams {
        println!("    Streams:  {}", streams);
    }
    if let Some(credits) = snapshot.total_credits {
        println!("    Credits:  {:.0}", credits);
    }
    println!("    Version:  {}", snapshot.network_version);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pulse_types::{LivenessState, NodeIdentity};

    fn node(key: &str, liveness: LivenessState) -> NodeRecord {
        NodeRecord {
            identity: NodeIdentity::Reported(key.to_string()),
            node_id: None,
            gossip_address: "10.0.0.1:9001".into(),
            rpc_address: "10.0.0.1:6000".into(),
            software_version: "1.0.0".into(),
            liveness,
            is_public: true,
            region: None,
            last_contact: Utc::now(),
            storage_committed_bytes: 0,
            storage_used_bytes: 0,
            storage_usage_percent: 0.0,
            uptime_seconds: 0,
            cpu_percent: None,
            ram_used_bytes: None,
            ram_total_bytes: None,
            packets_received: None,
            packets_sent: None,
            active_streams: None,
            total_bytes: None,
            total_pages: None,
            file_size_bytes: None,
            metadata_updated_at: None,
            credits: None,
        }
    }

    #[test]
    fn test_select_nodes_orders_online_first() {
        let nodes = vec![
            node("c", LivenessState::Offline),
            node("b", LivenessState::Online),
            node("a", LivenessState::Syncing),
            node("d", LivenessState::Online),
        ];
        let keys: Vec<_> = select_nodes(nodes.clone(), false, 10)
            .iter()
            .map(|n| n.key().to_string())
            .collect();
        assert_eq!(keys, vec!["b", "d", "a", "c"]);

        let online = select_nodes(nodes, true, 1);
        assert_eq!(online.len(), 1);
        assert_eq!(online[0].key(), "b");
    }
}
