mod orchestrator;
mod status;

pub use orchestrator::{CycleOutcome, SyncOrchestrator, NO_NODES_ERROR};
pub use status::{HealthReport, SyncCycleStatus};

#[cfg(test)]
mod tests;
