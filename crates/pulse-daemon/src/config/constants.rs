pub const DEFAULT_API_PORT: u16 = 3001;
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_CREDITS_URL: &str = "https://podcredits.xandeum.network/api/pods-credits";

pub const METHOD_GET_VERSION: &str = "get-version";
pub const METHOD_GET_STATS: &str = "get-stats";
pub const METHOD_GET_PODS: &str = "get-pods";
pub const METHOD_GET_PODS_WITH_STATS: &str = "get-pods-with-stats";
