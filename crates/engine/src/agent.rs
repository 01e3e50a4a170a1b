//! The front-end facade: the only surface a chat or CLI layer talks to.

use std::sync::Arc;

use wayfarer_config::AppConfig;
use wayfarer_core::{CapabilityDescriptor, ConversationTurn, EventBus};

use crate::orchestrator::{Orchestrator, TurnOutcome};
use crate::registry::DiscoveryReport;
use crate::store::ConversationStore;
use crate::suggestions::{self, SuggestionGroup};

pub struct TravelAgent {
    orchestrator: Orchestrator,
    history: ConversationStore,
}

impl TravelAgent {
    pub fn new(orchestrator: Orchestrator, history: ConversationStore) -> Self {
        Self {
            orchestrator,
            history,
        }
    }

    /// Build from configuration and run discovery once.
    pub async fn start(config: &AppConfig) -> wayfarer_core::Result<(Self, DiscoveryReport)> {
        let orchestrator = Orchestrator::from_config(config, Arc::new(EventBus::default()))?;
        let report = orchestrator.discover().await;
        Ok((Self::new(orchestrator, ConversationStore::new()), report))
    }

    /// Answer one request and record the turn.
    pub async fn process(&self, text: &str) -> String {
        self.process_turn(text).await.response
    }

    /// Like [`process`](Self::process), returning everything the turn produced.
    pub async fn process_turn(&self, text: &str) -> TurnOutcome {
        let outcome = self.orchestrator.run_turn(text).await;
        self.history
            .append(ConversationTurn::new(
                text,
                outcome.response.clone(),
                outcome.tools_used.clone(),
                outcome.classification.kind(),
            ))
            .await;
        outcome
    }

    pub async fn list_capabilities(&self) -> Vec<CapabilityDescriptor> {
        self.orchestrator
            .snapshot()
            .await
            .descriptors()
            .cloned()
            .collect()
    }

    pub async fn get_history(&self) -> Vec<ConversationTurn> {
        self.history.all().await
    }

    pub async fn get_suggestions(&self) -> Vec<SuggestionGroup> {
        let snapshot = self.orchestrator.snapshot().await;
        suggestions::suggestions(|domain| snapshot.serves(domain))
    }

    pub async fn rediscover(&self) -> DiscoveryReport {
        self.orchestrator.discover().await
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Stop every worker process.
    pub async fn shutdown(&self) {
        self.orchestrator.pool().shutdown().await;
    }
}
