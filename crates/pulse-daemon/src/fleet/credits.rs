use super::wire::CreditsResponse;
use crate::config::CreditsConfig;
use crate::rpc::classify;
use async_trait::async_trait;
use pulse_types::{PulseError, PulseResult, RpcError};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

/// Credits keyed by pod id or public key.
pub type CreditsMap = HashMap<String, f64>;

/// Side channel for per-node credits. Best effort: implementations return
/// an empty map instead of failing.
#[async_trait]
pub trait CreditsFeed: Send + Sync {
    async fn fetch_credits(&self) -> CreditsMap;
}

pub struct HttpCreditsFeed {
    client: Client,
    url: String,
}

impl HttpCreditsFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> PulseResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PulseError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &CreditsConfig) -> PulseResult<Self> {
        Self::new(config.url.clone(), Duration::from_millis(config.timeout_ms))
    }

    async fn fetch(&self) -> Result<CreditsResponse, RpcError> {
        let response = self.client.get(&self.url).send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Transport {
                message: format!("Credits feed returned status {}", status.as_u16()),
                status: Some(status.as_u16()),
            });
        }

        response
            .json::<CreditsResponse>()
            .await
            .map_err(|e| RpcError::Decode(e.to_string()))
    }
}

#[async_trait]
impl CreditsFeed for HttpCreditsFeed {
    async fn fetch_credits(&self) -> CreditsMap {
        match self.fetch().await {
            Ok(response) => credits_map(response),
            Err(e) => {
                warn!("Failed to fetch credits from {}: {}", self.url, e);
                CreditsMap::new()
            }
        }
    }
}

/// A non-success status is logged, but whatever entries came back are used.
pub fn credits_map(response: CreditsResponse) -> CreditsMap {
    match response.status.as_deref() {
        Some("success") => {}
        other => warn!("Credits feed returned non-success status: {:?}", other),
    }

    let map: CreditsMap = response
        .pods_credits
        .into_iter()
        .map(|entry| (entry.pod_id, entry.credits))
        .collect();

    info!("Fetched credits for {} pods", map.len());
    map
}
