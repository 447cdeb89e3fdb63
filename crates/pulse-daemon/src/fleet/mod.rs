mod credits;
mod normalize;
mod reader;
mod wire;

pub use credits::{credits_map, CreditsFeed, CreditsMap, HttpCreditsFeed};
pub use normalize::{derive_identity, identity_for, liveness_for, normalize, region_for, resolve_last_contact, split_address, NormalizeContext};
pub use reader::{assemble_fleet, FleetRead, FleetReader, FleetSource};
pub use wire::{CreditsResponse, GlobalStats, Pod, PodCredit, PodsResponse, StatsCounters, StatsMetadata, VersionResponse};
