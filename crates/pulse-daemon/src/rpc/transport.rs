use super::types::JsonRpcRequest;
use async_trait::async_trait;
use pulse_types::{PulseError, PulseResult, RpcError};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Moves one JSON-RPC request to an endpoint and returns the raw body.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn post(&self, endpoint: &str, request: &JsonRpcRequest) -> Result<Value, RpcError>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> PulseResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PulseError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn post(&self, endpoint: &str, request: &JsonRpcRequest) -> Result<Value, RpcError> {
        debug!("RPC POST {} method={} id={}", endpoint, request.method, request.id);

        let response = self
            .client
            .post(endpoint)
            .json(request)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Transport {
                message: format!("Request failed with status code {}", status.as_u16()),
                status: Some(status.as_u16()),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| if e.is_timeout() { RpcError::Timeout } else { RpcError::Decode(e.to_string()) })
    }
}

pub(crate) fn classify(e: reqwest::Error) -> RpcError {
    if e.is_timeout() {
        RpcError::Timeout
    } else {
        RpcError::Transport {
            message: e.to_string(),
            status: e.status().map(|s| s.as_u16()),
        }
    }
}
