#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod api;
pub mod cli;
pub mod config;
pub mod fleet;
pub mod rpc;
pub mod scheduler;
pub mod storage;
pub mod sync;

pub use aggregate::aggregate;
pub use api::{router, serve, ApiState};
pub use config::{ApiConfig, CreditsConfig, DaemonConfig, LoggingConfig, RpcConfig, RpcMethods, StorageSection, SyncConfig};
pub use fleet::{CreditsFeed, FleetRead, FleetReader, FleetSource, HttpCreditsFeed};
pub use rpc::{EndpointGateway, HttpTransport, RpcTransport};
pub use scheduler::{Cadence, Scheduler, SchedulerStatus};
pub use storage::{FleetStore, SledFleetStore, StorageMetrics};
pub use sync::{CycleOutcome, HealthReport, SyncCycleStatus, SyncOrchestrator};
