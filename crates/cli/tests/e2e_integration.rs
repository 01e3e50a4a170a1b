//! End-to-end tests for the Wayfarer travel agent.
//!
//! These drive whole turns through `TravelAgent`: classification, extraction,
//! routing, execution over real worker connections, and composition.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use wayfarer_config::BuiltinWorker;
use wayfarer_core::error::TransportError;
use wayfarer_core::{CapabilitySpec, EventBus, FailureKind, IntentKind, Slot, WorkerId};
use wayfarer_engine::{Composer, ConversationStore, Extractor, Orchestrator, TravelAgent};
use wayfarer_transport::{LocalConnection, StdioConnection, WorkerConnection, WorkerPool};

// ── Test workers ─────────────────────────────────────────────────────────

/// Advertises a built-in worker's capabilities, then never answers a call.
struct Stalled {
    id: WorkerId,
    kind: BuiltinWorker,
}

#[async_trait::async_trait]
impl WorkerConnection for Stalled {
    fn id(&self) -> &WorkerId {
        &self.id
    }

    async fn list_capabilities(&self) -> Result<Vec<CapabilitySpec>, TransportError> {
        Ok(wayfarer_workers::builtin_worker(self.kind, self.id.as_str()).specs())
    }

    async fn call(&self, _: &str, _: serde_json::Value) -> Result<String, TransportError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok("too late".into())
    }
}

/// Advertises a built-in worker's capabilities, then reports an error for every call.
struct Broken {
    id: WorkerId,
    kind: BuiltinWorker,
}

#[async_trait::async_trait]
impl WorkerConnection for Broken {
    fn id(&self) -> &WorkerId {
        &self.id
    }

    async fn list_capabilities(&self) -> Result<Vec<CapabilitySpec>, TransportError> {
        Ok(wayfarer_workers::builtin_worker(self.kind, self.id.as_str()).specs())
    }

    async fn call(&self, _: &str, _: serde_json::Value) -> Result<String, TransportError> {
        Err(TransportError::WorkerError {
            worker: self.id.to_string(),
            message: "upstream feed offline".into(),
        })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

const DEFAULT_WORKERS: [(&str, BuiltinWorker); 4] = [
    ("greeter", BuiltinWorker::Utility),
    ("trainline", BuiltinWorker::DemoTrains),
    ("real_trainline", BuiltinWorker::LiveTrains),
    ("multi_hotels", BuiltinWorker::Hotels),
];

const ROUND_TRIP: &str = "Plan a complete round trip from Leeds to East Croydon on 15/12/2025, returning 16/12/2025 for 1 person";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()
}

fn local_pool(call_timeout: Duration) -> WorkerPool {
    let mut pool = WorkerPool::new(call_timeout, Duration::from_secs(5));
    for (name, kind) in DEFAULT_WORKERS {
        pool.add(Arc::new(LocalConnection::new(wayfarer_workers::builtin_worker(kind, name))));
    }
    pool
}

async fn agent_with(pool: WorkerPool) -> TravelAgent {
    let orchestrator = Orchestrator::new(
        Arc::new(pool),
        Arc::new(Extractor::with_reference_date(today()).unwrap()),
        Composer::new(60, None),
        Arc::new(EventBus::default()),
    );
    let agent = TravelAgent::new(orchestrator, ConversationStore::new());
    agent.rediscover().await;
    agent
}

fn positions(text: &str, needles: &[&str]) -> Vec<usize> {
    needles
        .iter()
        .map(|n| text.find(n).unwrap_or_else(|| panic!("'{n}' missing from:\n{text}")))
        .collect()
}

fn in_order(positions: &[usize]) -> bool {
    positions.windows(2).all(|w| w[0] < w[1])
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_single_train_request() {
    let agent = agent_with(local_pool(Duration::from_secs(5))).await;
    let outcome = agent.process_turn("Find trains from Leeds to Manchester today").await;

    assert_eq!(outcome.classification.kind(), IntentKind::Single);
    assert_eq!(outcome.slots.value(Slot::FromLocation), Some("Leeds"));
    assert_eq!(outcome.slots.value(Slot::ToLocation), Some("Manchester"));
    assert_eq!(outcome.slots.value(Slot::Date), Some("2025-11-01"));
    assert_eq!(outcome.tools_used, vec!["real_trainline.search_live_trains"]);
    assert!(outcome.response.starts_with("TRAIN OPTIONS:\nLive train times: Leeds"));
    assert!(outcome.response.contains("Date: 2025-11-01"));
}

#[tokio::test]
async fn e2e_round_trip_plan() {
    let agent = agent_with(local_pool(Duration::from_secs(5))).await;
    let outcome = agent.process_turn(ROUND_TRIP).await;

    assert_eq!(outcome.classification.kind(), IntentKind::RoundTrip);
    assert_eq!(outcome.slots.value(Slot::Date), Some("2025-12-15"));
    assert_eq!(outcome.slots.value(Slot::ReturnDate), Some("2025-12-16"));
    assert_eq!(outcome.slots.value(Slot::Guests), Some("1"));
    assert_eq!(outcome.results.len(), 4);
    assert_eq!(outcome.failed_steps(), 0);

    let order = positions(
        &outcome.response,
        &["OUTBOUND JOURNEY", "CONNECTION:", "RETURN JOURNEY", "ACCOMMODATION:"],
    );
    assert!(in_order(&order));
    assert!(outcome.response.contains("Hotels in East Croydon\n2025-12-15 → 2025-12-16"));
}

#[tokio::test]
async fn e2e_hotel_request_infers_year() {
    let agent = agent_with(local_pool(Duration::from_secs(5))).await;
    let outcome = agent.process_turn("Find hotels in Paris for December 20-22").await;

    assert_eq!(outcome.classification.kind(), IntentKind::Single);
    assert_eq!(outcome.slots.value(Slot::HotelLocation), Some("Paris"));
    assert_eq!(outcome.tools_used, vec!["multi_hotels.search_hotels"]);
    assert!(outcome
        .response
        .starts_with("HOTEL OPTIONS:\nHotels in Paris\n2025-12-20 → 2025-12-22 (2 nights)"));
}

#[tokio::test]
async fn e2e_greeting_does_not_make_a_multi_intent() {
    let agent = agent_with(local_pool(Duration::from_secs(5))).await;
    let outcome = agent.process_turn("Hello Alice, find trains to Manchester").await;

    assert_eq!(outcome.classification.kind(), IntentKind::Single);
    assert_eq!(outcome.tools_used, vec!["real_trainline.search_live_trains"]);
    assert!(outcome.response.starts_with("TRAIN OPTIONS:"));
}

#[tokio::test(start_paused = true)]
async fn e2e_hotel_timeout_keeps_the_train_legs() {
    let pool = local_pool(Duration::from_secs(2)).with(Arc::new(Stalled {
        id: WorkerId::new("multi_hotels"),
        kind: BuiltinWorker::Hotels,
    }));
    let agent = agent_with(pool).await;
    let outcome = agent.process_turn(ROUND_TRIP).await;

    assert_eq!(outcome.results.len(), 4);
    assert!(outcome.results[0].is_success());
    assert!(outcome.results[2].is_success());
    assert_eq!(outcome.results[3].failure().unwrap().kind, FailureKind::WorkerTimeout);

    let order = positions(
        &outcome.response,
        &["OUTBOUND JOURNEY", "RETURN JOURNEY", "Sorry, I could not retrieve accommodation"],
    );
    assert!(in_order(&order));
}

// ── Partial failure ──────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_failed_train_legs_still_compose_every_step() {
    let pool = local_pool(Duration::from_secs(5)).with(Arc::new(Broken {
        id: WorkerId::new("real_trainline"),
        kind: BuiltinWorker::LiveTrains,
    }));
    let agent = agent_with(pool).await;
    let outcome = agent.process_turn(ROUND_TRIP).await;

    assert_eq!(outcome.results.len(), 4);
    assert_eq!(outcome.failed_steps(), 2);
    assert!(outcome.results[1].is_success());
    assert!(outcome.results[3].is_success());

    let order = positions(
        &outcome.response,
        &[
            "Sorry, I could not retrieve outbound journey",
            "CONNECTION:",
            "Sorry, I could not retrieve return journey",
            "Hotels in East Croydon",
        ],
    );
    assert!(in_order(&order));
    assert!(outcome.response.contains("upstream feed offline"));
}

#[tokio::test]
async fn e2e_history_records_every_turn() {
    let agent = agent_with(local_pool(Duration::from_secs(5))).await;
    agent.process("Hello, my name is Alice").await;
    agent.process("Find trains from Leeds to Manchester today").await;
    agent.process("tell me a joke").await;

    let history = agent.get_history().await;
    let intents: Vec<IntentKind> = history.iter().map(|t| t.intent).collect();
    assert_eq!(intents, vec![IntentKind::Single, IntentKind::Single, IntentKind::None]);
    assert_eq!(history[0].tools_used, vec!["greeter.greet"]);
    assert!(history[2].tools_used.is_empty());
    assert!(history[2].output.contains("Trains:"));
}

// ── Child-process workers ────────────────────────────────────────────────

#[tokio::test]
async fn e2e_hotels_served_by_a_child_process() {
    let mut pool = WorkerPool::new(Duration::from_secs(10), Duration::from_secs(10));
    pool.add(Arc::new(LocalConnection::new(wayfarer_workers::builtin_worker(
        BuiltinWorker::Utility,
        "greeter",
    ))));
    pool.add(Arc::new(StdioConnection::new(
        WorkerId::new("multi_hotels"),
        env!("CARGO_BIN_EXE_wayfarer"),
        vec!["worker".into(), "hotels".into(), "--name".into(), "multi_hotels".into()],
        BTreeMap::new(),
    )));

    let agent = agent_with(pool).await;
    let names: Vec<String> = agent
        .list_capabilities()
        .await
        .iter()
        .map(|d| d.qualified_name())
        .collect();
    assert!(names.contains(&"multi_hotels.search_hotels".to_string()));

    let answer = agent.process("Find hotels in Paris for December 20-22").await;
    assert!(answer.starts_with("HOTEL OPTIONS:\nHotels in Paris"), "{answer}");
    agent.shutdown().await;
}

#[tokio::test]
async fn e2e_unreachable_worker_is_left_out() {
    let mut pool = local_pool(Duration::from_secs(5));
    pool.add(Arc::new(StdioConnection::new(
        WorkerId::new("ghost"),
        "wayfarer-no-such-binary",
        vec![],
        BTreeMap::new(),
    )));

    let orchestrator = Orchestrator::new(
        Arc::new(pool),
        Arc::new(Extractor::with_reference_date(today()).unwrap()),
        Composer::new(60, None),
        Arc::new(EventBus::default()),
    );
    let report = orchestrator.discover().await;
    assert_eq!(report.discovered.len(), 4);
    assert_eq!(report.unavailable.len(), 1);
    assert_eq!(report.unavailable[0].0, WorkerId::new("ghost"));

    let outcome = orchestrator.run_turn("Calculate 15 * 7 + 3").await;
    assert!(outcome.response.contains("is: 108"));
}
