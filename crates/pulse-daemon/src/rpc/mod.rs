mod backoff;
mod gateway;
mod selector;
mod transport;
mod types;

pub use backoff::BackoffStrategy;
pub use gateway::EndpointGateway;
pub use selector::EndpointSelector;
pub use transport::{HttpTransport, RpcTransport};
pub use types::{into_result, CallOutcome, JsonRpcErrorBody, JsonRpcRequest};

pub(crate) use transport::classify;

#[cfg(test)]
mod tests;
