use super::commands::OutputFormat;
use super::utils::{dim, emit, load_config, print_fail, print_header, print_ok, print_warn};
use crate::sync::SyncCycleStatus;
use pulse_types::{PulseError, PulseResult};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// `/sync/status` as seen from outside the daemon.
#[derive(Debug, Serialize, Deserialize)]
pub struct RemoteSchedulerStatus {
    pub armed: bool,
    pub timer: String,
    pub interval_secs: u64,
    pub sync: SyncCycleStatus,
}

/// The configured bind address, with a wildcard bind mapped to loopback.
pub fn default_status_url(addr: SocketAddr) -> String {
    let host = if addr.ip().is_unspecified() {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    } else {
        addr.ip()
    };
    format!("http://{}", SocketAddr::new(host, addr.port()))
}

pub async fn fetch_status(base_url: &str) -> PulseResult<RemoteSchedulerStatus> {
    let url = format!("{}/sync/status", base_url.trim_end_matches('/'));
    let client = reqwest::Client::builder()
        .timeout(STATUS_TIMEOUT)
        .build()
        .map_err(|e| PulseError::Network(format!("Failed to build HTTP client: {}", e)))?;

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| PulseError::Network(format!("Daemon not reachable at {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(PulseError::Network(format!(
            "Daemon answered {} for {}",
            response.status(),
            url
        )));
    }

    response
        .json()
        .await
        .map_err(|e| PulseError::Serialization(format!("Invalid status response: {}", e)))
}

pub async fn show_status(
    config_path: &Path,
    data_dir: Option<&Path>,
    url: Option<String>,
    format: OutputFormat,
) -> PulseResult<()> {
    let base_url = match url {
        Some(url) => url,
        None => default_status_url(load_config(config_path, data_dir)?.api_socket_addr()),
    };

    let status = match fetch_status(&base_url).await {
        Ok(status) => status,
        Err(e) => {
            if format == OutputFormat::Text {
                print_fail(format!("Daemon is not running or API is disabled ({})", base_url));
            }
            return Err(e);
        }
    };

    emit(format, &status, || {
        print_header("Pulse Sync Status");
        if status.armed {
            print_ok(format!("Scheduler armed ({} timer, every {}s)", status.timer, status.interval_secs));
        } else {
            print_warn("Scheduler not armed");
        }
        if status.sync.is_running {
            println!("    Cycle in progress");
        }
        let never = || "never".to_string();
        println!(
            "    Last sync:  {}",
            status.sync.last_sync_at.map(|t| t.to_rfc3339()).unwrap_or_else(never)
        );
        println!(
            "    Next sync:  {}",
            status.sync.next_sync_at.map(|t| t.to_rfc3339()).unwrap_or_else(never)
        );
        println!("    Nodes:      {}", status.sync.nodes_synced);
        if let Some(ms) = status.sync.last_duration_ms {
            println!("    Duration:   {}ms", ms);
        }
        for error in &status.sync.errors {
            print_fail(error);
        }
        println!("    {}", dim(&base_url));
    })
}
