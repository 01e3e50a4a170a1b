//! Capability registry: what every reachable worker can do.
//!
//! The registry holds an immutable [`RegistrySnapshot`] behind an
//! `RwLock<Arc<_>>`. A turn clones the `Arc` once and reads it without
//! holding the lock; discovery builds a complete new snapshot and swaps it
//! in with a single write, so no turn ever observes a half-updated registry.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use wayfarer_core::error::{RegistryError, TransportError};
use wayfarer_core::{CapabilityDescriptor, CapabilitySpec, DataSource, Domain, DomainEvent, EventBus, WorkerId};
use wayfarer_transport::WorkerPool;

use crate::tags;

/// Build a descriptor from what a worker advertised.
pub fn describe(owner: &WorkerId, spec: &CapabilitySpec) -> CapabilityDescriptor {
    CapabilityDescriptor {
        name: spec.name.clone(),
        owner: owner.clone(),
        description: spec.description.clone(),
        argument_names: spec.argument_names(),
        required_arguments: spec.required_arguments(),
        keyword_tags: tags::derive_tags(&format!("{} {}", spec.name, spec.description)),
        source: DataSource::detect(&spec.name, owner, &spec.description),
    }
}

/// An immutable view of the registry, in worker order.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    workers: Vec<(WorkerId, Vec<CapabilityDescriptor>)>,
}

impl RegistrySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one worker's capabilities. Names repeated by the same
    /// worker keep their first declaration.
    pub fn with_worker(mut self, worker: WorkerId, specs: &[CapabilitySpec]) -> Self {
        let mut seen = HashSet::new();
        let descriptors: Vec<CapabilityDescriptor> = specs
            .iter()
            .filter(|s| seen.insert(s.name.clone()))
            .map(|s| describe(&worker, s))
            .collect();

        match self.workers.iter().position(|(id, _)| *id == worker) {
            Some(idx) => self.workers[idx].1 = descriptors,
            None => self.workers.push((worker, descriptors)),
        }
        self
    }

    /// Every descriptor, in registry order.
    pub fn descriptors(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.workers.iter().flat_map(|(_, d)| d.iter())
    }

    /// Look up a descriptor by qualified name (`<owner>.<name>`).
    pub fn get(&self, qualified_name: &str) -> Option<&CapabilityDescriptor> {
        self.descriptors().find(|d| d.qualified_name() == qualified_name)
    }

    pub fn resolve(&self, qualified_name: &str) -> Result<&CapabilityDescriptor, RegistryError> {
        self.get(qualified_name)
            .ok_or_else(|| RegistryError::UnknownCapability(qualified_name.to_string()))
    }

    pub fn workers(&self) -> impl Iterator<Item = (&WorkerId, &[CapabilityDescriptor])> {
        self.workers.iter().map(|(id, d)| (id, d.as_slice()))
    }

    /// Whether at least one capability serves `domain`.
    pub fn serves(&self, domain: Domain) -> bool {
        self.descriptors().any(|d| d.has_tag(domain.tag()))
    }

    pub fn len(&self) -> usize {
        self.descriptors().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What one discovery pass found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryReport {
    /// Workers that answered, with their capability counts
    pub discovered: Vec<(WorkerId, usize)>,
    /// Workers left out of the registry, with the reason
    pub unavailable: Vec<(WorkerId, String)>,
}

impl DiscoveryReport {
    pub fn total_capabilities(&self) -> usize {
        self.discovered.iter().map(|(_, n)| n).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.unavailable.is_empty()
    }
}

pub struct CapabilityRegistry {
    snapshot: RwLock<Arc<RegistrySnapshot>>,
    events: Arc<EventBus>,
}

impl CapabilityRegistry {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(RegistrySnapshot::new())),
            events,
        }
    }

    /// The current snapshot. Cheap; hold it for the whole turn.
    pub async fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.snapshot.read().await.clone()
    }

    /// Ask every worker in the pool for its capabilities and replace the
    /// snapshot. Workers that fail are left out; that is reported, not
    /// returned as an error.
    pub async fn discover(&self, pool: &WorkerPool) -> DiscoveryReport {
        let mut next = RegistrySnapshot::new();
        let mut report = DiscoveryReport::default();

        for worker in pool.workers() {
            match pool.list_capabilities(&worker).await {
                Ok(specs) => {
                    next = next.with_worker(worker.clone(), &specs);
                    let count = next
                        .workers()
                        .find(|(id, _)| **id == worker)
                        .map_or(0, |(_, d)| d.len());
                    info!(worker = %worker, capabilities = count, "Worker discovered");
                    self.events.publish(DomainEvent::WorkerDiscovered {
                        worker: worker.to_string(),
                        capabilities: count,
                        timestamp: Utc::now(),
                    });
                    report.discovered.push((worker, count));
                }
                Err(e) => {
                    let err = RegistryError::DiscoveryFailed {
                        worker: worker.to_string(),
                        source: e,
                    };
                    warn!(worker = %worker, error = %err, "Worker left out of the registry");
                    self.events.publish(DomainEvent::WorkerUnavailable {
                        worker: worker.to_string(),
                        reason: reason_of(&err),
                        timestamp: Utc::now(),
                    });
                    report.unavailable.push((worker, reason_of(&err)));
                }
            }
        }

        *self.snapshot.write().await = Arc::new(next);
        report
    }

    /// Re-discover a single worker, replacing only its entry.
    pub async fn refresh(&self, pool: &WorkerPool, worker: &WorkerId) -> Result<usize, RegistryError> {
        let outcome = pool.list_capabilities(worker).await;

        let mut guard = self.snapshot.write().await;
        let current = guard.as_ref().clone();
        match outcome {
            Ok(specs) => {
                let order = pool.workers();
                let mut next = current.with_worker(worker.clone(), &specs);
                next.workers
                    .sort_by_key(|(id, _)| order.iter().position(|w| w == id).unwrap_or(usize::MAX));
                let count = next
                    .workers()
                    .find(|(id, _)| *id == worker)
                    .map_or(0, |(_, d)| d.len());
                *guard = Arc::new(next);
                info!(worker = %worker, capabilities = count, "Worker refreshed");
                Ok(count)
            }
            Err(e) => {
                let mut next = current;
                next.workers.retain(|(id, _)| id != worker);
                *guard = Arc::new(next);
                let err = RegistryError::DiscoveryFailed {
                    worker: worker.to_string(),
                    source: e,
                };
                warn!(worker = %worker, error = %err, "Worker dropped from the registry");
                self.events.publish(DomainEvent::WorkerUnavailable {
                    worker: worker.to_string(),
                    reason: reason_of(&err),
                    timestamp: Utc::now(),
                });
                Err(err)
            }
        }
    }
}

fn reason_of(err: &RegistryError) -> String {
    match err {
        RegistryError::DiscoveryFailed { source, .. } => match source {
            TransportError::WorkerTimeout { timeout_ms, .. } => {
                format!("no answer within {timeout_ms}ms")
            }
            other => other.to_string(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use wayfarer_config::AppConfig;
    use wayfarer_transport::WorkerConnection;

    struct DeadConnection {
        id: WorkerId,
    }

    #[async_trait]
    impl WorkerConnection for DeadConnection {
        fn id(&self) -> &WorkerId {
            &self.id
        }

        async fn list_capabilities(&self) -> Result<Vec<CapabilitySpec>, TransportError> {
            Err(TransportError::WorkerUnreachable {
                worker: self.id.to_string(),
                reason: "connection refused".into(),
            })
        }

        async fn call(&self, _: &str, _: serde_json::Value) -> Result<String, TransportError> {
            Err(TransportError::WorkerUnreachable {
                worker: self.id.to_string(),
                reason: "connection refused".into(),
            })
        }
    }

    fn default_pool() -> WorkerPool {
        wayfarer_transport::build_from_config(&AppConfig::default())
    }

    #[tokio::test]
    async fn discovers_builtin_workers_in_order() {
        let registry = CapabilityRegistry::new(Arc::new(EventBus::default()));
        let report = registry.discover(&default_pool()).await;
        assert!(report.is_complete());
        assert_eq!(report.total_capabilities(), 12);

        let snapshot = registry.snapshot().await;
        let owners: Vec<&str> = snapshot.workers().map(|(id, _)| id.as_str()).collect();
        assert_eq!(owners, vec!["greeter", "trainline", "real_trainline", "multi_hotels"]);

        let live = snapshot.get("real_trainline.search_live_trains").unwrap();
        assert_eq!(live.source, DataSource::Live);
        assert!(live.has_tag("train") && live.has_tag("search"));
        assert_eq!(live.required_arguments, vec!["from_station", "to_station", "date"]);

        let demo = snapshot.get("trainline.search_trains").unwrap();
        assert_eq!(demo.source, DataSource::Demo);

        assert!(snapshot.get("multi_hotels.search_hotels").unwrap().has_tag("hotel"));
        assert!(snapshot.get("greeter.calculate").unwrap().has_tag("arithmetic"));
    }

    #[tokio::test]
    async fn unreachable_worker_is_left_out() {
        let events = Arc::new(EventBus::default());
        let mut rx = events.subscribe();
        let pool = default_pool().with(Arc::new(DeadConnection {
            id: WorkerId::new("multi_hotels"),
        }));
        let registry = CapabilityRegistry::new(events);
        let report = registry.discover(&pool).await;

        assert_eq!(report.unavailable.len(), 1);
        assert_eq!(report.unavailable[0].0, WorkerId::new("multi_hotels"));
        assert!(report.unavailable[0].1.contains("connection refused"));

        let snapshot = registry.snapshot().await;
        assert!(snapshot.get("multi_hotels.search_hotels").is_none());
        assert!(!snapshot.serves(Domain::Hotel));
        assert!(snapshot.serves(Domain::Train));

        let mut unavailable = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(*event, DomainEvent::WorkerUnavailable { .. }) {
                unavailable += 1;
            }
        }
        assert_eq!(unavailable, 1);
    }

    #[tokio::test]
    async fn old_snapshots_stay_valid_after_rediscovery() {
        let registry = CapabilityRegistry::new(Arc::new(EventBus::default()));
        registry.discover(&default_pool()).await;
        let before = registry.snapshot().await;

        let empty = WorkerPool::new(Duration::from_secs(1), Duration::from_secs(1));
        registry.discover(&empty).await;

        assert_eq!(before.len(), 12);
        assert!(registry.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn refresh_replaces_one_worker_and_keeps_order() {
        let pool = default_pool();
        let registry = CapabilityRegistry::new(Arc::new(EventBus::default()));
        registry.discover(&pool).await;

        let count = registry.refresh(&pool, &WorkerId::new("trainline")).await.unwrap();
        assert_eq!(count, 4);
        let snapshot = registry.snapshot().await;
        let owners: Vec<&str> = snapshot.workers().map(|(id, _)| id.as_str()).collect();
        assert_eq!(owners, vec!["greeter", "trainline", "real_trainline", "multi_hotels"]);
    }

    #[test]
    fn duplicate_names_keep_first_declaration() {
        let spec = |description: &str| CapabilitySpec {
            name: "search_hotels".into(),
            description: description.into(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
        };
        let snapshot = RegistrySnapshot::new()
            .with_worker(WorkerId::new("h"), &[spec("Search hotels"), spec("Other")]);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("h.search_hotels").unwrap().description, "Search hotels");
        assert!(matches!(
            snapshot.resolve("h.nothing"),
            Err(RegistryError::UnknownCapability(_))
        ));
    }
}
