//! Error types for the Wayfarer domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Wayfarer operations.
///
/// Backend-side problems never surface here during a turn: the engine turns
/// them into failed step results. What remains are setup failures and
/// genuine engine faults.
#[derive(Debug, Error)]
pub enum Error {
    // --- Transport errors ---
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    // --- Registry errors ---
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    // --- Capability errors ---
    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    // --- Extraction engine faults ---
    #[error("Extraction rule '{rule}' is invalid: {reason}")]
    Extraction { rule: String, reason: String },

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// A capability call that could not complete.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("Worker '{worker}' is unreachable: {reason}")]
    WorkerUnreachable { worker: String, reason: String },

    #[error("Worker '{worker}' timed out after {timeout_ms}ms")]
    WorkerTimeout { worker: String, timeout_ms: u64 },

    #[error("Worker '{worker}' sent a malformed response: {reason}")]
    MalformedWorkerResponse { worker: String, reason: String },

    #[error("Worker '{worker}' reported an error: {message}")]
    WorkerError { worker: String, message: String },

    #[error("Unknown worker: {0}")]
    UnknownWorker(String),
}

impl TransportError {
    /// The worker this error concerns.
    pub fn worker(&self) -> &str {
        match self {
            Self::WorkerUnreachable { worker, .. }
            | Self::WorkerTimeout { worker, .. }
            | Self::MalformedWorkerResponse { worker, .. }
            | Self::WorkerError { worker, .. } => worker,
            Self::UnknownWorker(worker) => worker,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("Discovery failed for worker '{worker}': {source}")]
    DiscoveryFailed {
        worker: String,
        #[source]
        source: TransportError,
    },

    #[error("Capability not registered: {0}")]
    UnknownCapability(String),
}

/// Errors raised by a capability implementation inside a worker.
#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    #[error("Capability not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Capability execution failed: {name}: {reason}")]
    ExecutionFailed { name: String, reason: String },
}
