//! # Wayfarer Engine
//!
//! Intent resolution and orchestration. A request goes through five stages,
//! each a separate module that can be tested on its own:
//!
//! 1. [`classifier`]: the shape of the request (single, multi-intent, round trip)
//! 2. [`extractor`]: slots pulled out by ordered pattern rules
//! 3. [`router`]: capabilities ranked by tag overlap against the [`registry`]
//! 4. [`planner`] and [`orchestrator`]: ordered steps, run one after another
//! 5. [`composer`]: one answer assembled from every step's outcome
//!
//! [`TravelAgent`] ties them together behind `process(text) -> text`.

pub mod agent;
pub mod classifier;
pub mod composer;
pub mod extractor;
pub mod orchestrator;
pub mod planner;
pub mod registry;
pub mod router;
pub mod store;
pub mod suggestions;
pub mod tags;

#[cfg(test)]
mod testing;

pub use agent::TravelAgent;
pub use classifier::Classifier;
pub use composer::Composer;
pub use extractor::Extractor;
pub use orchestrator::{Orchestrator, TurnOutcome};
pub use planner::Planner;
pub use registry::{CapabilityRegistry, DiscoveryReport, RegistrySnapshot};
pub use router::Router;
pub use store::ConversationStore;
pub use suggestions::SuggestionGroup;
