#![forbid(unsafe_code)]
#![warn(clippy::all)]

mod error;
mod node;
mod snapshot;

pub use error::{PulseError, PulseResult, RpcError, TIMEOUT_CODE};
pub use node::{LivenessState, NodeIdentity, NodeRecord};
pub use snapshot::NetworkSnapshot;

/// Below this many seconds since last contact a node is online.
pub const ONLINE_THRESHOLD_SECS: i64 = 55;

/// At or above this many seconds since last contact a node is offline.
pub const OFFLINE_THRESHOLD_SECS: i64 = 1800;

/// Gossip port assumed when a peer reports an address without one.
pub const DEFAULT_GOSSIP_PORT: u16 = 9001;

/// Every node serves its RPC on this port regardless of its gossip port.
pub const NODE_RPC_PORT: u16 = 6000;

/// Version reported in a snapshot of an empty fleet.
pub const UNKNOWN_VERSION: &str = "unknown";
