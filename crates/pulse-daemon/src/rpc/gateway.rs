use super::backoff::BackoffStrategy;
use super::selector::EndpointSelector;
use super::transport::{HttpTransport, RpcTransport};
use super::types::{into_result, CallOutcome, JsonRpcRequest};
use crate::config::RpcConfig;
use pulse_types::{PulseResult, RpcError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Single logical JSON-RPC interface over a list of redundant endpoints.
///
/// A failed attempt first rotates through the remaining endpoints, once
/// each. When rotation is exhausted, retryable failures are retried on the
/// endpoint then current with linear backoff.
pub struct EndpointGateway {
    selector: EndpointSelector,
    transport: Arc<dyn RpcTransport>,
    max_retries: u32,
    retry_base_delay: Duration,
    next_id: AtomicU64,
}

impl EndpointGateway {
    pub fn new(
        endpoints: Vec<String>,
        transport: Arc<dyn RpcTransport>,
        max_retries: u32,
        retry_base_delay: Duration,
    ) -> PulseResult<Self> {
        let selector = EndpointSelector::new(endpoints)?;
        info!("Initialized RPC gateway with {} endpoint(s)", selector.len());

        Ok(Self {
            selector,
            transport,
            max_retries,
            retry_base_delay,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &RpcConfig) -> PulseResult<Self> {
        let transport = Arc::new(HttpTransport::new(config.timeout())?);
        Self::new(
            config.endpoints.clone(),
            transport,
            config.max_retries,
            config.retry_base_delay(),
        )
    }

    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let result = self.call_value(method, params).await?;
        serde_json::from_value(result)
            .map_err(|e| RpcError::Decode(format!("{} result: {}", method, e)))
    }

    pub async fn call_value(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let request = JsonRpcRequest::new(self.next_id.fetch_add(1, Ordering::Relaxed), method, params);
        let endpoint_count = self.selector.len();
        let mut endpoint_attempts = 0;
        let mut backoff = BackoffStrategy::linear(self.retry_base_delay, self.max_retries);

        loop {
            let (idx, endpoint) = self.selector.current();
            let outcome = CallOutcome::from_result(
                self.transport.post(endpoint, &request).await.and_then(into_result),
            );

            let (error, retryable) = match outcome {
                CallOutcome::Success(value) => return Ok(value),
                CallOutcome::Retryable(e) => (e, true),
                CallOutcome::Terminal(e) => (e, false),
            };

            if endpoint_count > 1 && endpoint_attempts < endpoint_count - 1 {
                warn!("Endpoint {} failed for {}, trying next endpoint: {}", endpoint, method, error);
                self.selector.rotate_from(idx);
                endpoint_attempts += 1;
                continue;
            }

            if retryable {
                if let Some(delay) = backoff.next_delay() {
                    warn!(
                        "Retrying {} after {}ms (attempt {}/{}): {}",
                        method,
                        delay.as_millis(),
                        backoff.attempts(),
                        backoff.max_attempts(),
                        error
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
            }

            debug!("{} failed after {} retries: {}", method, backoff.attempts(), error);
            return Err(error);
        }
    }

    /// True when the version method answers on some endpoint.
    pub async fn ping(&self, method: &str) -> bool {
        match self.call_value(method, Value::Array(Vec::new())).await {
            Ok(_) => true,
            Err(e) => {
                warn!("RPC health probe failed: {}", e);
                false
            }
        }
    }

    pub fn current_endpoint(&self) -> &str {
        self.selector.current().1
    }

    pub fn endpoints(&self) -> &[String] {
        self.selector.endpoints()
    }
}
