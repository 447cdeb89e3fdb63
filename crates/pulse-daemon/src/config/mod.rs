mod api;
mod constants;
mod credits;
mod daemon;
mod logging;
mod rpc;
mod storage;
mod sync;
mod types;

pub use api::ApiConfig;
pub use constants::*;
pub use credits::CreditsConfig;
pub use daemon::{DaemonConfig, RedactedConfig};
pub use logging::LoggingConfig;
pub use rpc::{RpcConfig, RpcMethods};
pub use storage::StorageSection;
pub use sync::SyncConfig;
pub use types::*;
