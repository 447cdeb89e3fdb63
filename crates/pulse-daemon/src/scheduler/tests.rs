use super::*;
use crate::fleet::{FleetRead, FleetSource};
use crate::storage::SledFleetStore;
use crate::sync::{CycleOutcome, SyncOrchestrator};
use async_trait::async_trait;
use pulse_types::PulseResult;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct CountingFleet {
    reads: AtomicUsize,
}

#[async_trait]
impl FleetSource for CountingFleet {
    async fn fetch_fleet(&self) -> PulseResult<FleetRead> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(FleetRead::default())
    }

    async fn reachable(&self) -> bool {
        true
    }
}

fn scheduler(interval_secs: u64) -> (Scheduler, Arc<CountingFleet>) {
    let fleet = Arc::new(CountingFleet::default());
    let store = Arc::new(SledFleetStore::in_memory().unwrap());
    let orchestrator = Arc::new(SyncOrchestrator::new(fleet.clone(), store));
    (Scheduler::new(orchestrator, interval_secs), fleet)
}

#[tokio::test(start_paused = true)]
async fn test_fixed_period_fires_initial_and_periodic_cycles() {
    let (scheduler, fleet) = scheduler(30);
    scheduler.start();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(fleet.reads.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_secs(64)).await;
    assert_eq!(fleet.reads.load(Ordering::SeqCst), 3);

    let status = scheduler.status();
    assert!(status.armed);
    assert_eq!(status.timer, "interval");
    assert!(status.sync.next_sync_at.is_some());
    assert_eq!(status.sync.errors, vec!["No nodes fetched from fleet RPC".to_string()]);

    scheduler.stop();
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(fleet.reads.load(Ordering::SeqCst), 3);
    assert!(!scheduler.is_armed());
    assert!(scheduler.status().sync.next_sync_at.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_start_twice_arms_one_timer() {
    let (scheduler, fleet) = scheduler(10);
    scheduler.start();
    scheduler.start();

    tokio::time::sleep(Duration::from_secs(25)).await;
    // One initial cycle plus ticks at 10s and 20s.
    assert_eq!(fleet.reads.load(Ordering::SeqCst), 3);
    scheduler.stop();
}

#[tokio::test]
async fn test_stop_without_start_is_noop() {
    let (scheduler, _) = scheduler(60);
    scheduler.stop();
    scheduler.stop();
    assert!(!scheduler.is_armed());
    assert_eq!(scheduler.status().timer, "cron");
}

#[tokio::test]
async fn test_manual_trigger_runs_without_timer() {
    let (scheduler, fleet) = scheduler(300);
    let outcome = scheduler.trigger_sync().await.unwrap();
    assert_eq!(outcome, CycleOutcome::Empty);
    assert_eq!(fleet.reads.load(Ordering::SeqCst), 1);
    assert!(!scheduler.is_armed());
}

#[tokio::test(start_paused = true)]
async fn test_detached_trigger_returns_immediately() {
    let (scheduler, fleet) = scheduler(300);
    scheduler.trigger_detached();
    assert_eq!(fleet.reads.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(fleet.reads.load(Ordering::SeqCst), 1);
}

#[test]
fn test_cron_cadence_reported() {
    let (scheduler, _) = scheduler(7200);
    assert_eq!(scheduler.cadence(), Cadence::EveryNHours { hours: 2 });
}
