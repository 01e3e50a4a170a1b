//! Domain events published by the engine.
//!
//! The engine reports worker availability, capability calls and completed
//! turns here. Subscribers (the chat log under `--verbose`, tests) filter for what
//! they need.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use crate::conversation::IntentKind;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A worker answered discovery
    WorkerDiscovered {
        worker: String,
        capabilities: usize,
        timestamp: DateTime<Utc>,
    },

    /// A worker could not be discovered and was left out of the registry
    WorkerUnavailable {
        worker: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A capability call finished, successfully or not
    CapabilityInvoked {
        capability: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A turn was composed
    TurnCompleted {
        intent: IntentKind,
        steps: usize,
        failed_steps: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
