//! Orchestration plans and their results.

use serde::{Deserialize, Serialize};
use crate::error::TransportError;
use crate::worker::Domain;

/// What a step does when executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepAction {
    /// Call a capability by its qualified name.
    Invoke {
        capability: String,
        arguments: serde_json::Map<String, serde_json::Value>,
    },
    /// Synthesized text; no call is made.
    Note { text: String },
    /// A detected domain that no capability can serve.
    Unavailable { domain: Domain },
}

/// One unit of an orchestration plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationStep {
    /// Heading used when composing, e.g. "OUTBOUND JOURNEY (2025-12-15)"
    pub label: String,
    pub action: StepAction,
}

impl OrchestrationStep {
    pub fn invoke(
        label: impl Into<String>,
        capability: impl Into<String>,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            label: label.into(),
            action: StepAction::Invoke {
                capability: capability.into(),
                arguments,
            },
        }
    }

    pub fn note(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: StepAction::Note { text: text.into() },
        }
    }

    pub fn unavailable(label: impl Into<String>, domain: Domain) -> Self {
        Self {
            label: label.into(),
            action: StepAction::Unavailable { domain },
        }
    }

    /// The qualified capability name, for invoking steps.
    pub fn capability(&self) -> Option<&str> {
        match &self.action {
            StepAction::Invoke { capability, .. } => Some(capability),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    WorkerUnreachable,
    WorkerTimeout,
    MalformedWorkerResponse,
    WorkerError,
    UnknownCapability,
    NoMatchingCapability,
}

impl From<&TransportError> for FailureKind {
    fn from(err: &TransportError) -> Self {
        match err {
            TransportError::WorkerUnreachable { .. } | TransportError::UnknownWorker(_) => {
                FailureKind::WorkerUnreachable
            }
            TransportError::WorkerTimeout { .. } => FailureKind::WorkerTimeout,
            TransportError::MalformedWorkerResponse { .. } => FailureKind::MalformedWorkerResponse,
            TransportError::WorkerError { .. } => FailureKind::WorkerError,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailure {
    pub kind: FailureKind,
    /// Human-readable, shown to the user
    pub reason: String,
}

impl StepFailure {
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

impl From<TransportError> for StepFailure {
    fn from(err: TransportError) -> Self {
        let reason = match &err {
            TransportError::WorkerTimeout { worker, timeout_ms } => format!(
                "the {worker} service did not respond within {:.1}s",
                *timeout_ms as f64 / 1000.0
            ),
            TransportError::WorkerUnreachable { worker, .. }
            | TransportError::UnknownWorker(worker) => {
                format!("the {worker} service is unreachable")
            }
            TransportError::MalformedWorkerResponse { worker, .. } => {
                format!("the {worker} service sent a response that could not be read")
            }
            TransportError::WorkerError { message, .. } => message.clone(),
        };
        Self::new(FailureKind::from(&err), reason)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum StepOutcome {
    Success(String),
    Failed(StepFailure),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step: OrchestrationStep,
    pub outcome: StepOutcome,
}

impl StepResult {
    pub fn success(step: OrchestrationStep, text: impl Into<String>) -> Self {
        Self {
            step,
            outcome: StepOutcome::Success(text.into()),
        }
    }

    pub fn failed(step: OrchestrationStep, failure: StepFailure) -> Self {
        Self {
            step,
            outcome: StepOutcome::Failed(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, StepOutcome::Success(_))
    }

    pub fn failure(&self) -> Option<&StepFailure> {
        match &self.outcome {
            StepOutcome::Failed(f) => Some(f),
            StepOutcome::Success(_) => None,
        }
    }
}
