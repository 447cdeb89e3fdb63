use super::*;
use crate::fleet::{FleetRead, FleetSource};
use crate::storage::{FleetStore, SledFleetStore};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use pulse_types::{LivenessState, NetworkSnapshot, NodeIdentity, NodeRecord, PulseError, PulseResult, RpcError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

fn record(key: &str) -> NodeRecord {
    NodeRecord {
        identity: NodeIdentity::Reported(key.to_string()),
        node_id: None,
        gossip_address: "1.2.3.4:9001".into(),
        rpc_address: "1.2.3.4:6000".into(),
        software_version: "0.8.0".into(),
        liveness: LivenessState::Online,
        is_public: true,
        region: None,
        last_contact: Utc::now(),
        storage_committed_bytes: 100,
        storage_used_bytes: 50,
        storage_usage_percent: 50.0,
        uptime_seconds: 60,
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

/// Fleet that answers with a fixed node list, optionally waiting for a
/// release signal first.
struct FakeFleet {
    nodes: Vec<NodeRecord>,
    fail: AtomicBool,
    gate: Option<Arc<Notify>>,
    entered: Arc<Notify>,
    reachable: bool,
}

impl FakeFleet {
    fn with(nodes: Vec<NodeRecord>) -> Self {
        Self {
            nodes,
            fail: AtomicBool::new(false),
            gate: None,
            entered: Arc::new(Notify::new()),
            reachable: true,
        }
    }
}

#[async_trait]
impl FleetSource for FakeFleet {
    async fn fetch_fleet(&self) -> PulseResult<FleetRead> {
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(RpcError::Timeout.into());
        }
        Ok(FleetRead {
            raw_count: self.nodes.len(),
            nodes: self.nodes.clone(),
            version: "0.8.0".into(),
            ..FleetRead::default()
        })
    }

    async fn reachable(&self) -> bool {
        self.reachable
    }
}

/// Counts calls and delegates to an in-memory sled store.
struct CountingStore {
    inner: SledFleetStore,
    upserts: AtomicUsize,
    appends: AtomicUsize,
    fail_appends: bool,
    appended: Mutex<Vec<NetworkSnapshot>>,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: SledFleetStore::in_memory().unwrap(),
            upserts: AtomicUsize::new(0),
            appends: AtomicUsize::new(0),
            fail_appends: false,
            appended: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl FleetStore for CountingStore {
    async fn upsert_nodes(&self, nodes: &[NodeRecord]) -> PulseResult<usize> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert_nodes(nodes).await
    }

    async fn append_snapshot(&self, snapshot: &NetworkSnapshot) -> PulseResult<u64> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        if self.fail_appends {
            return Err(PulseError::Storage("disk full".into()));
        }
        self.appended.lock().push(snapshot.clone());
        self.inner.append_snapshot(snapshot).await
    }

    async fn probe(&self) -> PulseResult<()> {
        if self.fail_appends {
            return Err(PulseError::Storage("read-only".into()));
        }
        self.inner.probe().await
    }

    async fn load_node(&self, identity: &str) -> PulseResult<Option<NodeRecord>> {
        self.inner.load_node(identity).await
    }

    async fn list_nodes(&self) -> PulseResult<Vec<NodeRecord>> {
        self.inner.list_nodes().await
    }

    async fn latest_snapshots(&self, count: usize) -> PulseResult<Vec<NetworkSnapshot>> {
        self.inner.latest_snapshots(count).await
    }

    async fn node_count(&self) -> PulseResult<usize> {
        self.inner.node_count().await
    }
}

#[tokio::test]
async fn test_completed_cycle_persists_and_records_status() {
    let store = Arc::new(CountingStore::new());
    let orchestrator = SyncOrchestrator::new(
        Arc::new(FakeFleet::with(vec![record("A"), record("B")])),
        store.clone(),
    );

    let outcome = orchestrator.run_cycle().await.unwrap();
    match outcome {
        CycleOutcome::Completed { nodes_synced, snapshot, .. } => {
            assert_eq!(nodes_synced, 2);
            assert_eq!(snapshot.total_nodes, 2);
            assert_eq!(snapshot.online_nodes, 2);
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    let status = orchestrator.status();
    assert_eq!(status.nodes_synced, 2);
    assert!(status.last_sync_at.is_some());
    assert!(status.errors.is_empty());
    assert!(!status.is_running);
    assert_eq!(store.node_count().await.unwrap(), 2);
    assert_eq!(store.appended.lock().len(), 1);
}

#[tokio::test]
async fn test_overlapping_cycle_is_skipped() {
    let gate = Arc::new(Notify::new());
    let mut fleet = FakeFleet::with(vec![record("A")]);
    fleet.gate = Some(gate.clone());
    let entered = fleet.entered.clone();

    let store = Arc::new(CountingStore::new());
    let orchestrator = Arc::new(SyncOrchestrator::new(Arc::new(fleet), store.clone()));

    let first = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.run_cycle().await }
    });

    entered.notified().await;
    assert!(orchestrator.is_running());
    assert!(orchestrator.status().is_running);
    assert_eq!(orchestrator.run_cycle().await.unwrap(), CycleOutcome::Skipped);

    gate.notify_one();
    let outcome = first.await.unwrap().unwrap();
    assert!(matches!(outcome, CycleOutcome::Completed { .. }));
    assert_eq!(store.upserts.load(Ordering::SeqCst), 1);
    assert!(!orchestrator.is_running());
}

#[tokio::test]
async fn test_empty_fleet_records_soft_error_without_persisting() {
    let store = Arc::new(CountingStore::new());
    let orchestrator = SyncOrchestrator::new(Arc::new(FakeFleet::with(Vec::new())), store.clone());

    assert_eq!(orchestrator.run_cycle().await.unwrap(), CycleOutcome::Empty);

    let status = orchestrator.status();
    assert_eq!(status.errors, vec![NO_NODES_ERROR.to_string()]);
    assert!(status.errors[0].starts_with("No nodes fetched"));
    assert_eq!(status.nodes_synced, 0);
    assert!(status.last_sync_at.is_none());
    assert_eq!(store.upserts.load(Ordering::SeqCst), 0);
    assert_eq!(store.appends.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_persistence_error_is_recorded_and_returned() {
    let mut store = CountingStore::new();
    store.fail_appends = true;
    let store = Arc::new(store);
    let orchestrator = SyncOrchestrator::new(Arc::new(FakeFleet::with(vec![record("A")])), store.clone());

    let err = orchestrator.run_cycle().await.unwrap_err();
    assert!(matches!(err, PulseError::Storage(_)));

    let status = orchestrator.status();
    assert_eq!(status.errors, vec!["Storage error: disk full".to_string()]);
    assert!(!status.is_running);
    assert!(status.last_sync_at.is_none());

    // The guard released the cycle, so the next one runs.
    assert!(orchestrator.run_cycle().await.is_err());
    assert_eq!(store.upserts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_errors_cleared_on_next_cycle() {
    let fleet = Arc::new(FakeFleet::with(vec![record("A")]));
    fleet.fail.store(true, Ordering::SeqCst);
    let orchestrator = SyncOrchestrator::new(fleet.clone(), Arc::new(CountingStore::new()));

    assert!(orchestrator.run_cycle().await.is_err());
    assert_eq!(orchestrator.status().errors, vec!["RPC error: Request timeout".to_string()]);

    fleet.fail.store(false, Ordering::SeqCst);
    orchestrator.run_cycle().await.unwrap();
    assert!(orchestrator.status().errors.is_empty());
}

#[tokio::test]
async fn test_health_check_requires_both_sides() {
    let healthy = SyncOrchestrator::new(Arc::new(FakeFleet::with(Vec::new())), Arc::new(CountingStore::new()));
    let report = healthy.health_check().await;
    assert!(report.healthy);
    assert_eq!(report.reason, None);

    let mut fleet = FakeFleet::with(Vec::new());
    fleet.reachable = false;
    let report = SyncOrchestrator::new(Arc::new(fleet), Arc::new(CountingStore::new()))
        .health_check()
        .await;
    assert!(!report.healthy);
    assert!(!report.rpc_reachable);
    assert!(report.store_reachable);

    let mut store = CountingStore::new();
    store.fail_appends = true;
    let report = SyncOrchestrator::new(Arc::new(FakeFleet::with(Vec::new())), Arc::new(store))
        .health_check()
        .await;
    assert!(!report.healthy);
    assert!(report.reason.unwrap().contains("read-only"));
}

#[test]
fn test_next_sync_is_advisory() {
    let orchestrator = SyncOrchestrator::new(Arc::new(FakeFleet::with(Vec::new())), Arc::new(CountingStore::new()));
    let at = Utc::now();
    orchestrator.note_next_sync(Some(at));
    assert_eq!(orchestrator.status().next_sync_at, Some(at));
}
