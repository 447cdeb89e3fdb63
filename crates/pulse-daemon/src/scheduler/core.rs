use super::cadence::Cadence;
use crate::sync::{CycleOutcome, SyncCycleStatus, SyncOrchestrator};
use chrono::Utc;
use parking_lot::Mutex;
use pulse_types::PulseResult;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

struct ArmedTimer {
    cancel_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Owns the single repeating sync timer and the manual trigger.
pub struct Scheduler {
    orchestrator: Arc<SyncOrchestrator>,
    interval_secs: u64,
    cadence: Cadence,
    timer: Mutex<Option<ArmedTimer>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SchedulerStatus {
    pub armed: bool,
    pub timer: &'static str,
    pub cadence: Cadence,
    pub interval_secs: u64,
    pub sync: SyncCycleStatus,
}

impl Scheduler {
    pub fn new(orchestrator: Arc<SyncOrchestrator>, interval_secs: u64) -> Self {
        Self {
            orchestrator,
            interval_secs,
            cadence: Cadence::from_interval(interval_secs),
            timer: Mutex::new(None),
        }
    }

    /// Arm the timer and fire one cycle right away. Calling this while
    /// already armed does nothing.
    pub fn start(&self) {
        let mut timer = self.timer.lock();
        if timer.is_some() {
            warn!("Scheduler already started");
            return;
        }

        info!("Starting scheduler with interval: {}s ({})", self.interval_secs, self.cadence);

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(run_timer(self.orchestrator.clone(), self.cadence, cancel_rx));
        *timer = Some(ArmedTimer { cancel_tx, handle });
        drop(timer);

        info!("Scheduler armed with {} timer", self.timer_kind());
        spawn_cycle(self.orchestrator.clone(), "Initial sync");
    }

    /// Disarm the timer. A cycle already running is left to finish.
    pub fn stop(&self) {
        let Some(armed) = self.timer.lock().take() else {
            return;
        };

        let _ = armed.cancel_tx.send(true);
        armed.handle.abort();
        self.orchestrator.note_next_sync(None);
        info!("{} scheduler stopped", self.timer_kind());
    }

    pub fn is_armed(&self) -> bool {
        self.timer.lock().is_some()
    }

    /// Run a cycle now and wait for it. Overlap rules are the
    /// orchestrator's.
    pub async fn trigger_sync(&self) -> PulseResult<CycleOutcome> {
        info!("Manual sync triggered");
        self.orchestrator.run_cycle().await
    }

    /// Start a cycle in the background and return immediately. Failures
    /// land in the logs and the sync status.
    pub fn trigger_detached(&self) {
        spawn_cycle(self.orchestrator.clone(), "Manual sync");
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            armed: self.is_armed(),
            timer: self.timer_kind(),
            cadence: self.cadence,
            interval_secs: self.interval_secs,
            sync: self.orchestrator.status(),
        }
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    pub fn orchestrator(&self) -> &Arc<SyncOrchestrator> {
        &self.orchestrator
    }

    fn timer_kind(&self) -> &'static str {
        if self.cadence.is_fixed_period() {
            "interval"
        } else {
            "cron"
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_cycle(orchestrator: Arc<SyncOrchestrator>, trigger: &'static str) {
    tokio::spawn(async move {
        info!("{} - starting sync", trigger);
        if let Err(e) = orchestrator.run_cycle().await {
            error!("{} failed: {}", trigger, e);
        }
    });
}

async fn run_timer(orchestrator: Arc<SyncOrchestrator>, cadence: Cadence, mut cancel: watch::Receiver<bool>) {
    match cadence {
        Cadence::FixedPeriod { seconds } => {
            let period = Duration::from_secs(seconds);
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                orchestrator.note_next_sync(chrono::Duration::from_std(period).ok().map(|d| Utc::now() + d));
                tokio::select! {
                    _ = cancel.changed() => break,
                    _ = ticker.tick() => spawn_cycle(orchestrator.clone(), "Interval triggered"),
                }
            }
        }
        _ => {
            let mut next = cadence.next_fire(Utc::now());
            loop {
                orchestrator.note_next_sync(Some(next));
                let wait = (next - Utc::now()).to_std().unwrap_or_default();

                tokio::select! {
                    _ = cancel.changed() => break,
                    _ = tokio::time::sleep(wait) => spawn_cycle(orchestrator.clone(), "Cron tick triggered"),
                }
                next = cadence.next_after(next, Utc::now());
            }
        }
    }
}
