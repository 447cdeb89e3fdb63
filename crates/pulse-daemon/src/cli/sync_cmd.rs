use super::commands::OutputFormat;
use super::run::Pipeline;
use super::utils::{dim, emit, load_config, print_fail, print_header, print_ok, print_warn};
use crate::sync::CycleOutcome;
use pulse_types::{PulseError, PulseResult};
use serde_json::json;
use std::path::Path;

/// One cycle against the configured fleet, then exit.
pub async fn run_sync_once(
    config_path: &Path,
    data_dir: Option<&Path>,
    format: OutputFormat,
) -> PulseResult<()> {
    let config = load_config(config_path, data_dir)?;
    let pipeline = Pipeline::build(&config)?;

    let outcome = pipeline.scheduler.trigger_sync().await;
    pipeline.store.flush()?;
    let status = pipeline.orchestrator.status();

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            if format == OutputFormat::Json {
                super::utils::print_json(&json!({ "outcome": "failed", "status": status }))?;
            } else {
                print_fail(format!("Sync failed: {}", e));
            }
            return Err(e);
        }
    };

    match outcome {
        CycleOutcome::Completed {
            nodes_synced,
            duplicates_dropped,
            snapshot_id,
            snapshot,
        } => {
            let value = json!({
                "outcome": "completed",
                "nodes_synced": nodes_synced,
                "duplicates_dropped": duplicates_dropped,
                "snapshot_id": snapshot_id,
                "snapshot": snapshot,
                "duration_ms": status.last_duration_ms,
            });
            emit(format, &value, || {
                print_ok(format!(
                    "Synced {} node(s) in {}ms",
                    nodes_synced,
                    status.last_duration_ms.unwrap_or(0)
                ));
                if duplicates_dropped > 0 {
                    print_warn(format!("Dropped {} duplicate entries", duplicates_dropped));
                }
                println!(
                    "    Online:   {}/{} ({:.1}%)",
                    snapshot.online_nodes,
                    snapshot.total_nodes,
                    snapshot.online_ratio() * 100.0
                );
                println!("    Storage:  {:.2}% used", snapshot.avg_storage_usage_percent);
                println!("    Version:  {}", snapshot.network_version);
                println!("    {}", dim(format!("snapshot #{}", snapshot_id)));
            })
        }
        CycleOutcome::Empty => {
            emit(format, &json!({ "outcome": "empty", "errors": status.errors }), || {
                print_warn("Fleet returned no nodes; nothing persisted");
            })
        }
        CycleOutcome::Skipped => Err(PulseError::Internal(
            "Sync cycle skipped: another cycle is running".into(),
        )),
    }
}

/// Probe the fleet RPC and the store once.
pub async fn run_checks(
    config_path: &Path,
    data_dir: Option<&Path>,
    format: OutputFormat,
) -> PulseResult<()> {
    let config = load_config(config_path, data_dir)?;
    if let Err(e) = config.validate() {
        if format == OutputFormat::Text {
            print_fail(format!("Configuration: {}", e));
        }
        return Err(e);
    }

    let pipeline = Pipeline::build(&config)?;
    let report = pipeline.orchestrator.health_check().await;

    emit(format, &report, || {
        print_header("Pulse Diagnostics");
        print_ok(format!("Configuration: {:?}", config_path));
        if report.rpc_reachable {
            print_ok(format!("Fleet RPC: {}", pipeline.gateway.current_endpoint()));
        } else {
            print_fail(format!(
                "Fleet RPC: no endpoint answered ({} configured)",
                pipeline.gateway.endpoints().len()
            ));
        }
        if report.store_reachable {
            print_ok(format!(
                "Store: {:?} ({} bytes, {} snapshot(s))",
                pipeline.store.data_path(),
                pipeline.store.size_on_disk().unwrap_or(0),
                pipeline.store.snapshot_count()
            ));
        } else {
            print_fail(format!("Store: {:?}", pipeline.store.data_path()));
        }
        if let Some(reason) = &report.reason {
            println!("    {}", dim(reason));
        }
    })?;

    if report.healthy {
        Ok(())
    } else {
        Err(PulseError::Internal(
            report.reason.unwrap_or_else(|| "unhealthy".to_string()),
        ))
    }
}
