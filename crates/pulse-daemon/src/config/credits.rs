use serde::{Deserialize, Serialize};
use super::constants::{DEFAULT_CREDITS_URL, DEFAULT_RPC_TIMEOUT_MS};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditsConfig {
    pub url: String,
    pub timeout_ms: u64,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CREDITS_URL.to_string(),
            timeout_ms: DEFAULT_RPC_TIMEOUT_MS,
        }
    }
}
