//! The connection trait every worker is reached through.

use async_trait::async_trait;
use wayfarer_core::error::TransportError;
use wayfarer_core::rpc::{self, RpcResponse};
use wayfarer_core::{CapabilitySpec, WorkerId};

/// One logical connection to a worker.
///
/// Implementations perform a single request/response exchange per call and
/// never retry; timeouts are applied by the [`WorkerPool`](crate::WorkerPool).
#[async_trait]
pub trait WorkerConnection: Send + Sync {
    /// The worker on the other end.
    fn id(&self) -> &WorkerId;

    /// Ask the worker for its capability list (`tools/list`).
    async fn list_capabilities(&self) -> Result<Vec<CapabilitySpec>, TransportError>;

    /// Invoke one capability (`tools/call`) and return its text result.
    async fn call(
        &self,
        capability: &str,
        arguments: serde_json::Value,
    ) -> Result<String, TransportError>;

    /// Release whatever the connection holds. Safe to call more than once.
    async fn shutdown(&self) {}
}

/// Unwrap the `result` of a response to request `request_id`.
pub fn expect_result(
    worker: &WorkerId,
    request_id: u64,
    response: RpcResponse,
) -> Result<serde_json::Value, TransportError> {
    if response.id != Some(request_id) {
        return Err(malformed(
            worker,
            format!(
                "expected response id {request_id}, got {}",
                response.id.map_or_else(|| "none".to_string(), |id| id.to_string())
            ),
        ));
    }
    if let Some(error) = response.error {
        return Err(TransportError::WorkerError {
            worker: worker.to_string(),
            message: error.message,
        });
    }
    response
        .result
        .ok_or_else(|| malformed(worker, "response has neither result nor error"))
}

/// Unwrap a `tools/call` response into its text payload.
pub fn expect_text(
    worker: &WorkerId,
    request_id: u64,
    response: RpcResponse,
) -> Result<String, TransportError> {
    let result = expect_result(worker, request_id, response)?;
    rpc::decode_text(&result).ok_or_else(|| malformed(worker, "result has no text content"))
}

/// Unwrap a `tools/list` response into capability specs.
pub fn expect_tool_list(
    worker: &WorkerId,
    request_id: u64,
    response: RpcResponse,
) -> Result<Vec<CapabilitySpec>, TransportError> {
    let result = expect_result(worker, request_id, response)?;
    rpc::decode_tool_list(&result).map_err(|reason| malformed(worker, reason))
}

fn malformed(worker: &WorkerId, reason: impl Into<String>) -> TransportError {
    TransportError::MalformedWorkerResponse {
        worker: worker.to_string(),
        reason: reason.into(),
    }
}
