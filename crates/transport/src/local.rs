//! In-process worker connection.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::debug;
use wayfarer_core::error::TransportError;
use wayfarer_core::{CapabilitySet, CapabilitySpec, RpcRequest, WorkerId};

use crate::connection::{self, WorkerConnection};

/// Hosts a [`CapabilitySet`] in the engine's own process.
///
/// Requests still go through [`CapabilitySet::handle`], so an in-process
/// worker answers exactly as it would over stdio.
pub struct LocalConnection {
    id: WorkerId,
    set: CapabilitySet,
    next_request: AtomicU64,
}

impl LocalConnection {
    pub fn new(set: CapabilitySet) -> Self {
        Self {
            id: WorkerId::new(set.server_name()),
            set,
            next_request: AtomicU64::new(1),
        }
    }

    fn request_id(&self) -> u64 {
        self.next_request.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl WorkerConnection for LocalConnection {
    fn id(&self) -> &WorkerId {
        &self.id
    }

    async fn list_capabilities(&self) -> Result<Vec<CapabilitySpec>, TransportError> {
        let id = self.request_id();
        let response = self.set.handle(&RpcRequest::list(id)).await;
        connection::expect_tool_list(&self.id, id, response)
    }

    async fn call(
        &self,
        capability: &str,
        arguments: serde_json::Value,
    ) -> Result<String, TransportError> {
        let id = self.request_id();
        debug!(worker = %self.id, capability = %capability, "In-process call");
        let response = self.set.handle(&RpcRequest::call(id, capability, arguments)).await;
        connection::expect_text(&self.id, id, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_config::BuiltinWorker;

    fn greeter() -> LocalConnection {
        LocalConnection::new(wayfarer_workers::builtin_worker(BuiltinWorker::Utility, "greeter"))
    }

    #[tokio::test]
    async fn lists_capabilities_in_order() {
        let conn = greeter();
        assert_eq!(conn.id().as_str(), "greeter");
        let names: Vec<String> = conn
            .list_capabilities()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["greet", "calculate", "get_time"]);
    }

    #[tokio::test]
    async fn call_returns_text() {
        let out = greeter()
            .call("calculate", serde_json::json!({"expression": "2 + 3 * 4"}))
            .await
            .unwrap();
        assert_eq!(out, "The result of '2 + 3 * 4' is: 14");
    }

    #[tokio::test]
    async fn backend_errors_surface_as_worker_errors() {
        let err = greeter()
            .call("teleport", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::WorkerError { ref message, .. }
            if message.contains("Tool not found: teleport")));
    }
}
