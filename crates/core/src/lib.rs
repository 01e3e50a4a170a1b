//! # Wayfarer Core
//!
//! Domain types, traits, and error definitions for the Wayfarer travel
//! orchestration engine. This crate has **no framework dependencies**: it
//! defines the domain model that the worker, transport and engine crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every backend capability speaks the same small contract: a name, a set of
//! named arguments, and a text result. The engine never cares whether the
//! capability runs in-process or behind a child process, which keeps the
//! classification and routing policy testable in isolation.

pub mod error;
pub mod capability;
pub mod worker;
pub mod rpc;
pub mod intent;
pub mod plan;
pub mod conversation;
pub mod event;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use capability::{Capability, CapabilitySet, CapabilitySpec};
pub use worker::{CapabilityDescriptor, DataSource, Domain, WorkerId};
pub use rpc::{RpcRequest, RpcResponse};
pub use intent::{IntentClassification, KeywordGroup, ParsedSlots, Slot, SlotOrigin, SlotValue};
pub use plan::{FailureKind, OrchestrationStep, StepAction, StepFailure, StepOutcome, StepResult};
pub use conversation::{ConversationTurn, IntentKind};
pub use event::{DomainEvent, EventBus};
