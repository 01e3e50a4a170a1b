//! Shared fixtures for the engine's unit tests.

use wayfarer_config::{AppConfig, WorkerKind};
use wayfarer_core::WorkerId;

use crate::registry::RegistrySnapshot;

/// The default built-in workers, discovered synchronously.
pub fn builtin_snapshot() -> RegistrySnapshot {
    let config = AppConfig::default();
    config
        .enabled_workers()
        .fold(RegistrySnapshot::new(), |snapshot, worker| match &worker.kind {
            WorkerKind::Builtin { worker: kind } => {
                let set = wayfarer_workers::builtin_worker(*kind, &worker.name);
                snapshot.with_worker(WorkerId::new(&worker.name), &set.specs())
            }
            WorkerKind::Process { .. } => snapshot,
        })
}
