use thiserror::Error;

/// HTTP-style code carried by [`RpcError::Timeout`].
pub const TIMEOUT_CODE: i64 = 408;

#[derive(Error, Debug)]
pub enum PulseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type PulseResult<T> = Result<T, PulseError>;

/// Failure of one logical call against the node fleet.
///
/// Timeouts, other transport failures and errors reported by the remote
/// node are kept apart so callers can tell an unreachable fleet from one
/// that rejected the request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RpcError {
    #[error("Request timeout")]
    Timeout,

    #[error("{message}")]
    Transport { message: String, status: Option<u16> },

    #[error("{message} (code {code})")]
    Protocol {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl RpcError {
    pub fn code(&self) -> Option<i64> {
        match self {
            RpcError::Timeout => Some(TIMEOUT_CODE),
            RpcError::Transport { status, .. } => status.map(i64::from),
            RpcError::Protocol { code, .. } => Some(*code),
            RpcError::Decode(_) => None,
        }
    }

    /// Transport failures are always worth another attempt. Protocol errors
    /// are retried unless their code sits in the client-error range.
    pub fn is_retryable(&self) -> bool {
        match self {
            RpcError::Timeout | RpcError::Transport { .. } => true,
            RpcError::Protocol { code, .. } => !(400..500).contains(code),
            RpcError::Decode(_) => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RpcError::Timeout)
    }
}
