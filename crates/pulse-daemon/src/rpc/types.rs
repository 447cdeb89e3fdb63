use pulse_types::RpcError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: &str, params: Value) -> Self {
        let params = match params {
            Value::Null => Value::Array(Vec::new()),
            other => other,
        };

        Self {
            jsonrpc: "2.0",
            id,
            method: method.to_string(),
            params,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct JsonRpcErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Split a raw JSON-RPC response body into its result or a protocol error.
pub fn into_result(body: Value) -> Result<Value, RpcError> {
    let mut body = match body {
        Value::Object(map) => map,
        other => {
            return Err(RpcError::Decode(format!(
                "expected JSON-RPC object, got {}",
                type_name(&other)
            )))
        }
    };

    if let Some(error) = body.remove("error").filter(|e| !e.is_null()) {
        let parsed: JsonRpcErrorBody = serde_json::from_value(error.clone()).unwrap_or(
            JsonRpcErrorBody {
                code: None,
                message: Some(error.to_string()),
                data: None,
            },
        );

        return Err(RpcError::Protocol {
            code: parsed.code.unwrap_or(0),
            message: parsed.message.unwrap_or_else(|| "RPC Error".to_string()),
            data: parsed.data,
        });
    }

    body.remove("result")
        .ok_or_else(|| RpcError::Decode("response has neither result nor error".into()))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Result of a single attempt against one endpoint, as seen by the retry loop.
#[derive(Debug)]
pub enum CallOutcome {
    Success(Value),
    Retryable(RpcError),
    Terminal(RpcError),
}

impl CallOutcome {
    pub fn from_result(result: Result<Value, RpcError>) -> Self {
        match result {
            Ok(value) => CallOutcome::Success(value),
            Err(e) if e.is_retryable() => CallOutcome::Retryable(e),
            Err(e) => CallOutcome::Terminal(e),
        }
    }
}
