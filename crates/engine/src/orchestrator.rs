//! One turn, start to finish: classify, extract, plan, execute, compose.
//!
//! Steps run strictly in plan order and a failed step never stops the
//! ones after it. Backend problems end up as failed [`StepResult`]s; the
//! turn itself always produces text.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};
use wayfarer_config::AppConfig;
use wayfarer_core::{
    Domain, DomainEvent, EventBus, FailureKind, IntentClassification, KeywordGroup,
    OrchestrationStep, ParsedSlots, StepAction, StepFailure, StepResult,
};
use wayfarer_transport::WorkerPool;

use crate::classifier::Classifier;
use crate::composer::Composer;
use crate::extractor::Extractor;
use crate::planner::Planner;
use crate::registry::{CapabilityRegistry, DiscoveryReport, RegistrySnapshot};
use crate::router::Router;

/// Everything one turn produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub classification: IntentClassification,
    pub slots: ParsedSlots,
    pub results: Vec<StepResult>,
    pub response: String,
    /// Qualified names of the capabilities the turn dispatched, in order
    pub tools_used: Vec<String>,
}

impl TurnOutcome {
    pub fn failed_steps(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }
}

pub struct Orchestrator {
    pool: Arc<WorkerPool>,
    registry: Arc<CapabilityRegistry>,
    extractor: Arc<Extractor>,
    classifier: Classifier,
    planner: Planner,
    composer: Composer,
    events: Arc<EventBus>,
}

impl Orchestrator {
    pub fn new(
        pool: Arc<WorkerPool>,
        extractor: Arc<Extractor>,
        composer: Composer,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            registry: Arc::new(CapabilityRegistry::new(events.clone())),
            classifier: Classifier::new(extractor.clone()),
            planner: Planner::new(Router::new()),
            pool,
            extractor,
            composer,
            events,
        }
    }

    /// Build the worker pool and every engine part from configuration.
    /// Discovery is left to the caller.
    pub fn from_config(config: &AppConfig, events: Arc<EventBus>) -> wayfarer_core::Result<Self> {
        let pool = Arc::new(wayfarer_transport::build_from_config(config));
        let extractor = Arc::new(Extractor::new()?);
        Ok(Self::new(pool, extractor, Composer::from_config(&config.response), events))
    }

    pub async fn discover(&self) -> DiscoveryReport {
        self.registry.discover(&self.pool).await
    }

    pub async fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.registry.snapshot().await
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub async fn run_turn(&self, text: &str) -> TurnOutcome {
        let started = Instant::now();
        let snapshot = self.registry.snapshot().await;

        let classification = self.classifier.classify(text);
        let slots = match &classification {
            IntentClassification::RoundTrip { slots } => slots.clone(),
            _ => self.extractor.extract(text),
        };
        let today = self.extractor.reference_date();
        let plan = self
            .planner
            .build_plan(text, &classification, &slots, &snapshot, today);

        let classification = settle_domain(classification, &plan, &snapshot);

        let tools_used = plan
            .iter()
            .filter_map(|s| s.capability().map(str::to_string))
            .collect();

        let (results, response) = if plan.is_empty() {
            let served: Vec<Domain> = Domain::ALL
                .into_iter()
                .filter(|d| snapshot.serves(*d))
                .collect();
            (Vec::new(), self.composer.help(&served))
        } else {
            let results = self.execute(plan, &snapshot).await;
            let response = self.composer.compose(&results);
            (results, response)
        };

        let outcome = TurnOutcome {
            classification,
            slots,
            results,
            response,
            tools_used,
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            intent = %outcome.classification.kind(),
            steps = outcome.results.len(),
            failed = outcome.failed_steps(),
            duration_ms,
            "Turn completed"
        );
        self.events.publish(DomainEvent::TurnCompleted {
            intent: outcome.classification.kind(),
            steps: outcome.results.len(),
            failed_steps: outcome.failed_steps(),
            duration_ms,
            timestamp: Utc::now(),
        });
        outcome
    }

    /// Run every step in order. Never stops early.
    pub async fn execute(
        &self,
        plan: Vec<OrchestrationStep>,
        snapshot: &RegistrySnapshot,
    ) -> Vec<StepResult> {
        let mut results = Vec::with_capacity(plan.len());
        for step in plan {
            let outcome = match &step.action {
                StepAction::Note { text } => Ok(text.clone()),
                StepAction::Unavailable { domain } => {
                    warn!(domain = %domain, label = %step.label, "No capability for detected domain");
                    Err(StepFailure::new(
                        FailureKind::NoMatchingCapability,
                        format!("no {domain} capability is registered"),
                    ))
                }
                StepAction::Invoke {
                    capability,
                    arguments,
                } => self.invoke(capability, arguments, snapshot).await,
            };
            results.push(match outcome {
                Ok(text) => StepResult::success(step, text),
                Err(failure) => StepResult::failed(step, failure),
            });
        }
        results
    }

    async fn invoke(
        &self,
        capability: &str,
        arguments: &serde_json::Map<String, serde_json::Value>,
        snapshot: &RegistrySnapshot,
    ) -> Result<String, StepFailure> {
        let descriptor = snapshot.resolve(capability).map_err(|e| {
            warn!(capability = %capability, "Planned capability is not registered");
            StepFailure::new(FailureKind::UnknownCapability, e.to_string())
        })?;

        let started = Instant::now();
        let outcome = self
            .pool
            .call(
                &descriptor.owner,
                &descriptor.name,
                serde_json::Value::Object(arguments.clone()),
            )
            .await;
        let duration_ms = started.elapsed().as_millis() as u64;

        self.events.publish(DomainEvent::CapabilityInvoked {
            capability: capability.to_string(),
            success: outcome.is_ok(),
            duration_ms,
            timestamp: Utc::now(),
        });

        outcome.map_err(|e| {
            warn!(capability = %capability, error = %e, duration_ms, "Step failed");
            StepFailure::from(e)
        })
    }
}

/// A request with no domain keyword that still routed to a capability is a
/// single request in that capability's domain.
fn settle_domain(
    classification: IntentClassification,
    plan: &[OrchestrationStep],
    snapshot: &RegistrySnapshot,
) -> IntentClassification {
    match classification {
        IntentClassification::Single { groups } if groups.is_empty() => {
            let routed = plan
                .first()
                .and_then(OrchestrationStep::capability)
                .and_then(|name| snapshot.get(name))
                .and_then(|descriptor| descriptor.domain());
            let groups = routed
                .map(|domain| vec![KeywordGroup { domain, keywords: Vec::new() }])
                .unwrap_or_default();
            IntentClassification::Single { groups }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::time::Duration;
    use wayfarer_config::BuiltinWorker;
    use wayfarer_core::error::TransportError;
    use wayfarer_core::{CapabilitySpec, IntentKind, StepOutcome, WorkerId};
    use wayfarer_transport::{LocalConnection, WorkerConnection};

    /// Advertises the real hotel capabilities but never answers a call.
    struct StalledHotels {
        id: WorkerId,
    }

    #[async_trait]
    impl WorkerConnection for StalledHotels {
        fn id(&self) -> &WorkerId {
            &self.id
        }

        async fn list_capabilities(&self) -> Result<Vec<CapabilitySpec>, TransportError> {
            Ok(wayfarer_workers::builtin_worker(BuiltinWorker::Hotels, "multi_hotels").specs())
        }

        async fn call(&self, _: &str, _: serde_json::Value) -> Result<String, TransportError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".into())
        }
    }

    fn extractor() -> Arc<Extractor> {
        let today = NaiveDate::from_ymd_opt(2025, 11, 1).unwrap();
        Arc::new(Extractor::with_reference_date(today).unwrap())
    }

    fn builtin_pool() -> WorkerPool {
        let mut pool = WorkerPool::new(Duration::from_secs(2), Duration::from_secs(2));
        for (name, kind) in [
            ("greeter", BuiltinWorker::Utility),
            ("trainline", BuiltinWorker::DemoTrains),
            ("real_trainline", BuiltinWorker::LiveTrains),
            ("multi_hotels", BuiltinWorker::Hotels),
        ] {
            pool.add(Arc::new(LocalConnection::new(wayfarer_workers::builtin_worker(kind, name))));
        }
        pool
    }

    async fn orchestrator(pool: WorkerPool) -> Orchestrator {
        let orchestrator = Orchestrator::new(
            Arc::new(pool),
            extractor(),
            Composer::new(60, None),
            Arc::new(EventBus::default()),
        );
        orchestrator.discover().await;
        orchestrator
    }

    const ROUND_TRIP: &str = "Plan a complete round trip from Leeds to East Croydon on 15/12/2025, returning 16/12/2025 for 1 person";

    #[tokio::test]
    async fn single_request_end_to_end() {
        let o = orchestrator(builtin_pool()).await;
        let outcome = o.run_turn("Find trains from Leeds to Manchester today").await;
        assert_eq!(outcome.classification.kind(), IntentKind::Single);
        assert_eq!(outcome.tools_used, vec!["real_trainline.search_live_trains"]);
        assert!(outcome.response.starts_with("TRAIN OPTIONS:\nLive train times: Leeds (LDS)"));
        assert_eq!(outcome.failed_steps(), 0);
    }

    #[tokio::test]
    async fn round_trip_runs_all_steps_in_order() {
        let o = orchestrator(builtin_pool()).await;
        let outcome = o.run_turn(ROUND_TRIP).await;
        assert_eq!(outcome.classification.kind(), IntentKind::RoundTrip);
        assert_eq!(outcome.results.len(), 4);
        assert!(outcome.results.iter().all(StepResult::is_success));

        let response = &outcome.response;
        let positions: Vec<usize> = ["OUTBOUND JOURNEY", "CONNECTION:", "RETURN JOURNEY", "ACCOMMODATION:"]
            .iter()
            .map(|label| response.find(label).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(response.contains("Hotels in East Croydon"));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_hotel_step_does_not_sink_the_trip() {
        let pool = builtin_pool().with(Arc::new(StalledHotels {
            id: WorkerId::new("multi_hotels"),
        }));
        let o = orchestrator(pool).await;
        let outcome = o.run_turn(ROUND_TRIP).await;

        assert_eq!(outcome.results.len(), 4);
        assert!(outcome.results[0].is_success());
        assert!(outcome.results[2].is_success());
        let failure = outcome.results[3].failure().unwrap();
        assert_eq!(failure.kind, FailureKind::WorkerTimeout);
        assert!(outcome
            .response
            .contains("Sorry, I could not retrieve accommodation: the multi_hotels service did not respond within 2.0s"));
    }

    #[tokio::test]
    async fn unknown_capability_fails_locally() {
        let o = orchestrator(builtin_pool()).await;
        let snapshot = o.snapshot().await;
        let plan = vec![
            OrchestrationStep::invoke("RESULT", "ghost.vanish", Default::default()),
            OrchestrationStep::note("CONNECTION", "Change at York"),
        ];
        let results = o.execute(plan, &snapshot).await;
        assert_eq!(results[0].failure().unwrap().kind, FailureKind::UnknownCapability);
        assert_eq!(results[1].outcome, StepOutcome::Success("Change at York".into()));
    }

    #[tokio::test]
    async fn route_shape_alone_settles_on_the_routed_domain() {
        let o = orchestrator(builtin_pool()).await;
        let outcome = o.run_turn("from Leeds to York").await;
        assert_eq!(outcome.tools_used, vec!["real_trainline.search_live_trains"]);
        assert_eq!(outcome.classification.kind(), IntentKind::Single);
        assert_eq!(outcome.classification.domains(), vec![Domain::Train]);
        assert!(outcome.response.starts_with("TRAIN OPTIONS:"));
    }

    #[tokio::test]
    async fn unmatched_request_gets_help() {
        let o = orchestrator(builtin_pool()).await;
        let outcome = o.run_turn("tell me a joke").await;
        assert!(outcome.results.is_empty());
        assert!(outcome.tools_used.is_empty());
        assert!(outcome.response.contains("Trains:"));
        assert!(outcome.response.contains("Hotels:"));
    }

    #[tokio::test]
    async fn events_cover_calls_and_turns() {
        let o = orchestrator(builtin_pool()).await;
        let mut rx = o.events().subscribe();
        o.run_turn("Calculate 15 * 7 + 3").await;

        match rx.recv().await.unwrap().as_ref() {
            DomainEvent::CapabilityInvoked {
                capability,
                success,
                ..
            } => {
                assert_eq!(capability, "greeter.calculate");
                assert!(*success);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(
            rx.recv().await.unwrap().as_ref(),
            DomainEvent::TurnCompleted { steps: 1, failed_steps: 0, intent: IntentKind::Single, .. }
        ));
    }
}
