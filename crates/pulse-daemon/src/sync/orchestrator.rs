use super::status::{HealthReport, SyncCycleStatus};
use crate::aggregate::aggregate;
use crate::fleet::FleetSource;
use crate::storage::FleetStore;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use pulse_types::{NetworkSnapshot, PulseResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

pub const NO_NODES_ERROR: &str = "No nodes fetched from fleet RPC";

#[derive(Clone, Debug, PartialEq)]
pub enum CycleOutcome {
    /// Another cycle was already running.
    Skipped,
    /// The fleet answered with no nodes. Nothing was persisted.
    Empty,
    Completed {
        nodes_synced: usize,
        duplicates_dropped: usize,
        snapshot_id: u64,
        snapshot: NetworkSnapshot,
    },
}

/// Drives fetch, upsert, aggregate and append for one cycle at a time.
pub struct SyncOrchestrator {
    fleet: Arc<dyn FleetSource>,
    store: Arc<dyn FleetStore>,
    status: RwLock<SyncCycleStatus>,
    running: AtomicBool,
}

/// Returns the orchestrator to idle however the cycle ends.
struct RunningGuard<'a>(&'a SyncOrchestrator);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.status.write().is_running = false;
        self.0.running.store(false, Ordering::Release);
    }
}

impl SyncOrchestrator {
    pub fn new(fleet: Arc<dyn FleetSource>, store: Arc<dyn FleetStore>) -> Self {
        Self {
            fleet,
            store,
            status: RwLock::new(SyncCycleStatus::default()),
            running: AtomicBool::new(false),
        }
    }

    /// Run one cycle unless one is already in flight, in which case this is
    /// a no-op returning [`CycleOutcome::Skipped`]. Fleet and store errors
    /// are recorded in the status and returned.
    pub async fn run_cycle(&self) -> PulseResult<CycleOutcome> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Sync already in progress, skipping");
            return Ok(CycleOutcome::Skipped);
        }
        let _guard = RunningGuard(self);

        {
            let mut status = self.status.write();
            status.is_running = true;
            status.errors.clear();
        }

        let span = info_span!("sync_cycle", cycle = %Uuid::new_v4());
        let result = self.cycle().instrument(span).await;

        if let Err(e) = &result {
            error!("Sync failed: {}", e);
            self.status.write().errors.push(e.to_string());
        }
        result
    }

    async fn cycle(&self) -> PulseResult<CycleOutcome> {
        let started = Instant::now();
        info!("Starting fleet sync");

        let read = self.fleet.fetch_fleet().await?;
        if read.is_empty() {
            warn!("{}", NO_NODES_ERROR);
            self.status.write().errors.push(NO_NODES_ERROR.to_string());
            return Ok(CycleOutcome::Empty);
        }
        info!("Fetched {} nodes from fleet RPC", read.nodes.len());

        let nodes_synced = self.store.upsert_nodes(&read.nodes).await?;
        let snapshot = aggregate(&read.nodes, Utc::now());
        let snapshot_id = self.store.append_snapshot(&snapshot).await?;

        let duration_ms = started.elapsed().as_millis() as u64;
        {
            let mut status = self.status.write();
            status.last_sync_at = Some(Utc::now());
            status.nodes_synced = nodes_synced;
            status.last_duration_ms = Some(duration_ms);
        }

        info!(
            nodes_synced,
            total_nodes = snapshot.total_nodes,
            online_nodes = snapshot.online_nodes,
            duplicates = read.duplicates_dropped,
            malformed = read.malformed_dropped,
            "Sync completed in {}ms",
            duration_ms
        );

        Ok(CycleOutcome::Completed {
            nodes_synced,
            duplicates_dropped: read.duplicates_dropped,
            snapshot_id,
            snapshot,
        })
    }

    pub fn status(&self) -> SyncCycleStatus {
        self.status.read().clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn note_next_sync(&self, at: Option<DateTime<Utc>>) {
        self.status.write().next_sync_at = at;
    }

    /// Healthy only when some RPC endpoint answers and the store probe
    /// succeeds. Never fails; the reason names what did not pass.
    pub async fn health_check(&self) -> HealthReport {
        let (rpc_reachable, probe) = futures::join!(self.fleet.reachable(), self.store.probe());

        let mut reasons = Vec::new();
        if !rpc_reachable {
            error!("Fleet RPC health check failed");
            reasons.push("fleet RPC unreachable".to_string());
        }
        if let Err(e) = &probe {
            error!("Store health check failed: {}", e);
            reasons.push(format!("store probe failed: {}", e));
        }

        HealthReport {
            healthy: reasons.is_empty(),
            rpc_reachable,
            store_reachable: probe.is_ok(),
            reason: (!reasons.is_empty()).then(|| reasons.join("; ")),
        }
    }
}
