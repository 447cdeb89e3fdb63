use super::*;
use async_trait::async_trait;
use parking_lot::Mutex;
use pulse_types::{PulseError, RpcError};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// Replays queued replies per endpoint and records every request.
#[derive(Default)]
struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Result<Value, RpcError>>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedTransport {
    fn reply(&self, endpoint: &str, reply: Result<Value, RpcError>) {
        self.replies
            .lock()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(reply);
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl RpcTransport for ScriptedTransport {
    async fn post(&self, endpoint: &str, request: &JsonRpcRequest) -> Result<Value, RpcError> {
        self.calls
            .lock()
            .push((endpoint.to_string(), request.method.clone()));

        self.replies
            .lock()
            .get_mut(endpoint)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| {
                Err(RpcError::Transport {
                    message: "connection refused".into(),
                    status: None,
                })
            })
    }
}

fn ok(result: Value) -> Result<Value, RpcError> {
    Ok(json!({ "jsonrpc": "2.0", "id": 1, "result": result }))
}

fn refused() -> Result<Value, RpcError> {
    Err(RpcError::Transport {
        message: "connection refused".into(),
        status: None,
    })
}

fn endpoints(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("http://10.0.0.{}:6000/rpc", i + 1)).collect()
}

fn gateway(n: usize, transport: Arc<ScriptedTransport>, max_retries: u32) -> EndpointGateway {
    EndpointGateway::new(endpoints(n), transport, max_retries, Duration::from_millis(1000))
        .expect("gateway")
}

#[tokio::test]
async fn test_failover_lands_on_healthy_endpoint_and_sticks() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.reply("http://10.0.0.1:6000/rpc", refused());
    transport.reply("http://10.0.0.2:6000/rpc", refused());
    transport.reply("http://10.0.0.3:6000/rpc", ok(json!({ "version": "0.7.1" })));
    transport.reply("http://10.0.0.3:6000/rpc", ok(json!({ "version": "0.7.1" })));

    let gw = gateway(3, transport.clone(), 3);
    let result = gw.call_value("get-version", Value::Null).await.unwrap();

    assert_eq!(result, json!({ "version": "0.7.1" }));
    assert_eq!(gw.current_endpoint(), "http://10.0.0.3:6000/rpc");

    // The next call starts on the endpoint that answered last time.
    gw.call_value("get-version", Value::Null).await.unwrap();
    let calls = transport.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[3].0, "http://10.0.0.3:6000/rpc");
}

#[tokio::test]
async fn test_client_protocol_error_is_not_retried() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.reply(
        "http://10.0.0.1:6000/rpc",
        Ok(json!({ "jsonrpc": "2.0", "id": 1, "error": { "code": 404, "message": "no such method" } })),
    );

    let gw = gateway(1, transport.clone(), 3);
    let err = gw.call_value("get-stats", Value::Null).await.unwrap_err();

    assert_eq!(err.code(), Some(404));
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn test_terminal_error_still_rotates_endpoints() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.reply(
        "http://10.0.0.1:6000/rpc",
        Ok(json!({ "jsonrpc": "2.0", "id": 1, "error": { "code": 403, "message": "forbidden" } })),
    );
    transport.reply("http://10.0.0.2:6000/rpc", ok(json!(42)));

    let gw = gateway(2, transport.clone(), 3);
    let n: u64 = gw.call("get-stats", Value::Null).await.unwrap();
    assert_eq!(n, 42);
}

#[tokio::test(start_paused = true)]
async fn test_timeouts_retry_with_linear_backoff() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.reply("http://10.0.0.1:6000/rpc", Err(RpcError::Timeout));
    transport.reply("http://10.0.0.1:6000/rpc", Err(RpcError::Timeout));
    transport.reply("http://10.0.0.1:6000/rpc", ok(json!("pong")));

    let gw = gateway(1, transport.clone(), 3);
    let started = tokio::time::Instant::now();
    let result: String = gw.call("get-version", Value::Null).await.unwrap();

    assert_eq!(result, "pong");
    assert_eq!(transport.calls().len(), 3);
    // 1s after the first failure, 2s after the second.
    let waited = started.elapsed();
    assert!(waited >= Duration::from_millis(3000));
    assert!(waited < Duration::from_millis(3100));
}

#[tokio::test(start_paused = true)]
async fn test_retries_exhausted_returns_last_error() {
    let transport = Arc::new(ScriptedTransport::default());
    for _ in 0..4 {
        transport.reply("http://10.0.0.1:6000/rpc", Err(RpcError::Timeout));
    }

    let gw = gateway(1, transport.clone(), 3);
    let err = gw.call_value("get-pods", Value::Null).await.unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.code(), Some(408));
    assert_eq!(transport.calls().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_rotation_precedes_backoff() {
    let transport = Arc::new(ScriptedTransport::default());
    // Nothing queued: every endpoint refuses every attempt.
    let gw = gateway(2, transport.clone(), 2);
    let err = gw.call_value("get-pods", Value::Null).await.unwrap_err();

    assert!(matches!(err, RpcError::Transport { .. }));
    let calls = transport.calls();
    // One rotation, then two backoff retries on the endpoint rotated to.
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0].0, "http://10.0.0.1:6000/rpc");
    assert!(calls[1..].iter().all(|(e, _)| e == "http://10.0.0.2:6000/rpc"));
}

#[tokio::test]
async fn test_decode_failure_is_terminal() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.reply("http://10.0.0.1:6000/rpc", Ok(json!({ "jsonrpc": "2.0", "id": 1 })));

    let gw = gateway(1, transport.clone(), 3);
    let err = gw.call_value("get-stats", Value::Null).await.unwrap_err();

    assert!(matches!(err, RpcError::Decode(_)));
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn test_typed_result_mismatch_is_decode_error() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.reply("http://10.0.0.1:6000/rpc", ok(json!("not a number")));

    let gw = gateway(1, transport, 0);
    let err = gw.call::<u64>("get-stats", Value::Null).await.unwrap_err();
    assert!(matches!(err, RpcError::Decode(_)));
}

#[test]
fn test_empty_endpoint_list_is_config_error() {
    let transport = Arc::new(ScriptedTransport::default());
    let result = EndpointGateway::new(Vec::new(), transport, 3, Duration::from_millis(1000));
    assert!(matches!(result, Err(PulseError::Config(_))));
}

#[test]
fn test_concurrent_rotation_advances_once() {
    let selector = EndpointSelector::new(endpoints(3)).unwrap();
    assert_eq!(selector.rotate_from(0), 1);
    // A second caller that also failed on endpoint 0 must not skip endpoint 1.
    assert_eq!(selector.rotate_from(0), 1);
    assert_eq!(selector.current().0, 1);
    assert_eq!(selector.rotate_from(2), 1);
    assert_eq!(selector.rotate_from(1), 2);
    assert_eq!(selector.rotate_from(2), 0);
}

#[test]
fn test_request_envelope() {
    let request = JsonRpcRequest::new(7, "get-pods", Value::Null);
    let encoded = serde_json::to_value(&request).unwrap();
    assert_eq!(
        encoded,
        json!({ "jsonrpc": "2.0", "id": 7, "method": "get-pods", "params": [] })
    );
}

#[test]
fn test_error_body_without_code() {
    let err = into_result(json!({ "error": "boom" })).unwrap_err();
    match err {
        RpcError::Protocol { code, .. } => assert_eq!(code, 0),
        other => panic!("unexpected {:?}", other),
    }
}
