//! Worker pool: owns every connection and bounds every call.
//!
//! The pool is passed explicitly into the engine. It keeps connections in
//! configuration order, which is also the registry order the router falls
//! back on when everything else ties.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use wayfarer_config::{AppConfig, WorkerKind};
use wayfarer_core::error::TransportError;
use wayfarer_core::{CapabilitySpec, WorkerId};

use crate::connection::WorkerConnection;
use crate::local::LocalConnection;
use crate::stdio::StdioConnection;

pub struct WorkerPool {
    connections: Vec<Arc<dyn WorkerConnection>>,
    call_timeout: Duration,
    discovery_timeout: Duration,
}

impl WorkerPool {
    pub fn new(call_timeout: Duration, discovery_timeout: Duration) -> Self {
        Self {
            connections: Vec::new(),
            call_timeout,
            discovery_timeout,
        }
    }

    /// Add a connection. A connection for an already known worker replaces
    /// the old one in place.
    pub fn add(&mut self, connection: Arc<dyn WorkerConnection>) {
        match self
            .connections
            .iter()
            .position(|c| c.id() == connection.id())
        {
            Some(idx) => self.connections[idx] = connection,
            None => self.connections.push(connection),
        }
    }

    /// Builder-style [`add`](Self::add).
    pub fn with(mut self, connection: Arc<dyn WorkerConnection>) -> Self {
        self.add(connection);
        self
    }

    /// Worker ids in pool order.
    pub fn workers(&self) -> Vec<WorkerId> {
        self.connections.iter().map(|c| c.id().clone()).collect()
    }

    pub fn connection(&self, worker: &WorkerId) -> Option<&Arc<dyn WorkerConnection>> {
        self.connections.iter().find(|c| c.id() == worker)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    pub fn discovery_timeout(&self) -> Duration {
        self.discovery_timeout
    }

    /// Invoke a capability on a worker, bounded by the call timeout.
    pub async fn call(
        &self,
        worker: &WorkerId,
        capability: &str,
        arguments: serde_json::Value,
    ) -> Result<String, TransportError> {
        let connection = self
            .connection(worker)
            .ok_or_else(|| TransportError::UnknownWorker(worker.to_string()))?;

        let started = Instant::now();
        match tokio::time::timeout(self.call_timeout, connection.call(capability, arguments)).await
        {
            Ok(result) => {
                debug!(
                    worker = %worker,
                    capability = %capability,
                    duration_ms = started.elapsed().as_millis() as u64,
                    ok = result.is_ok(),
                    "Worker call finished"
                );
                result
            }
            Err(_) => {
                warn!(
                    worker = %worker,
                    capability = %capability,
                    timeout_secs = self.call_timeout.as_secs_f64(),
                    "Worker call timed out"
                );
                Err(TransportError::WorkerTimeout {
                    worker: worker.to_string(),
                    timeout_ms: self.call_timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Ask a worker for its capabilities, bounded by the discovery timeout.
    pub async fn list_capabilities(
        &self,
        worker: &WorkerId,
    ) -> Result<Vec<CapabilitySpec>, TransportError> {
        let connection = self
            .connection(worker)
            .ok_or_else(|| TransportError::UnknownWorker(worker.to_string()))?;

        tokio::time::timeout(self.discovery_timeout, connection.list_capabilities())
            .await
            .unwrap_or_else(|_| {
                warn!(
                    worker = %worker,
                    timeout_secs = self.discovery_timeout.as_secs_f64(),
                    "Capability listing timed out"
                );
                Err(TransportError::WorkerTimeout {
                    worker: worker.to_string(),
                    timeout_ms: self.discovery_timeout.as_millis() as u64,
                })
            })
    }

    /// Shut down every connection.
    pub async fn shutdown(&self) {
        for connection in &self.connections {
            connection.shutdown().await;
        }
    }
}

/// Build the pool from configuration: built-in workers run in-process,
/// process workers get a lazily spawned child.
pub fn build_from_config(config: &AppConfig) -> WorkerPool {
    let mut pool = WorkerPool::new(
        config.transport.call_timeout(),
        config.transport.discovery_timeout(),
    );

    for worker in config.enabled_workers() {
        let connection: Arc<dyn WorkerConnection> = match &worker.kind {
            WorkerKind::Builtin { worker: kind } => Arc::new(LocalConnection::new(
                wayfarer_workers::builtin_worker(*kind, &worker.name),
            )),
            WorkerKind::Process { command, args, env } => Arc::new(StdioConnection::new(
                WorkerId::new(&worker.name),
                command.clone(),
                args.clone(),
                env.clone(),
            )),
        };
        pool.add(connection);
    }

    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use wayfarer_config::{BuiltinWorker, WorkerConfig};

    /// A worker that never answers.
    struct HangingConnection {
        id: WorkerId,
    }

    #[async_trait]
    impl WorkerConnection for HangingConnection {
        fn id(&self) -> &WorkerId {
            &self.id
        }

        async fn list_capabilities(&self) -> Result<Vec<CapabilitySpec>, TransportError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![])
        }

        async fn call(
            &self,
            _capability: &str,
            _arguments: serde_json::Value,
        ) -> Result<String, TransportError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".into())
        }
    }

    fn hanging(name: &str) -> Arc<dyn WorkerConnection> {
        Arc::new(HangingConnection {
            id: WorkerId::new(name),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let pool = WorkerPool::new(Duration::from_millis(1500), Duration::from_secs(5))
            .with(hanging("multi_hotels"));
        let err = pool
            .call(&WorkerId::new("multi_hotels"), "search_hotels", serde_json::json!({}))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransportError::WorkerTimeout {
                worker: "multi_hotels".into(),
                timeout_ms: 1500,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_listing_uses_discovery_timeout() {
        let pool = WorkerPool::new(Duration::from_secs(15), Duration::from_secs(5))
            .with(hanging("trainline"));
        let err = pool
            .list_capabilities(&WorkerId::new("trainline"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::WorkerTimeout { timeout_ms: 5000, .. }));
    }

    #[tokio::test]
    async fn unknown_worker() {
        let pool = WorkerPool::new(Duration::from_secs(1), Duration::from_secs(1));
        let err = pool
            .call(&WorkerId::new("nobody"), "greet", serde_json::json!({}))
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::UnknownWorker("nobody".into()));
    }

    #[test]
    fn add_replaces_in_place() {
        let mut pool = WorkerPool::new(Duration::from_secs(1), Duration::from_secs(1))
            .with(hanging("a"))
            .with(hanging("b"));
        pool.add(hanging("a"));
        assert_eq!(pool.workers(), vec![WorkerId::new("a"), WorkerId::new("b")]);
    }

    #[test]
    fn default_config_builds_four_workers_in_order() {
        let pool = build_from_config(&AppConfig::default());
        let names: Vec<String> = pool.workers().into_iter().map(|w| w.0).collect();
        assert_eq!(names, vec!["greeter", "trainline", "real_trainline", "multi_hotels"]);
        assert_eq!(pool.call_timeout(), Duration::from_secs(15));
        assert_eq!(pool.discovery_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn disabled_workers_are_skipped() {
        let mut config = AppConfig::default();
        config.workers = vec![
            WorkerConfig::builtin("greeter", BuiltinWorker::Utility),
            WorkerConfig {
                enabled: false,
                ..WorkerConfig::builtin("multi_hotels", BuiltinWorker::Hotels)
            },
        ];
        assert_eq!(build_from_config(&config).workers(), vec![WorkerId::new("greeter")]);
    }

    #[tokio::test]
    async fn builtin_calls_go_through_the_pool() {
        let pool = build_from_config(&AppConfig::default());
        let out = pool
            .call(&WorkerId::new("greeter"), "greet", serde_json::json!({"name": "Alice"}))
            .await
            .unwrap();
        assert!(out.starts_with("Hello, Alice!"));
    }
}
