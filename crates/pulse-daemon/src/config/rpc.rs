use serde::{Deserialize, Serialize};
use std::time::Duration;
use super::constants::*;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub endpoints: Vec<String>,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub methods: RpcMethods,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            timeout_ms: DEFAULT_RPC_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            methods: RpcMethods::default(),
        }
    }
}

impl RpcConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Parse a comma-separated endpoint list, dropping blanks.
    pub fn parse_endpoints(list: &str) -> Vec<String> {
        list.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Names of the four fleet queries. The wire contract only fixes their
/// meaning, so deployments may rename them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcMethods {
    pub version: String,
    pub stats: String,
    pub pods: String,
    pub pods_with_stats: String,
}

impl Default for RpcMethods {
    fn default() -> Self {
        Self {
            version: METHOD_GET_VERSION.to_string(),
            stats: METHOD_GET_STATS.to_string(),
            pods: METHOD_GET_PODS.to_string(),
            pods_with_stats: METHOD_GET_PODS_WITH_STATS.to_string(),
        }
    }
}

impl RpcMethods {
    pub fn all(&self) -> [(&'static str, &str); 4] {
        [
            ("version", &self.version),
            ("stats", &self.stats),
            ("pods", &self.pods),
            ("pods_with_stats", &self.pods_with_stats),
        ]
    }
}
