//! Built-in workers for Wayfarer.
//!
//! Each worker is a [`CapabilitySet`] answering with fixed or
//! deterministically generated sample data. They can be hosted in-process
//! or served over stdio with [`server::serve_stdio`], which is what
//! `wayfarer worker <kind>` does.

pub mod demo_trains;
pub mod hotels;
pub mod live_trains;
pub mod server;
pub mod stations;
pub mod utility;

use wayfarer_config::BuiltinWorker;
use wayfarer_core::CapabilitySet;
use wayfarer_core::error::CapabilityError;

pub use server::{serve, serve_stdio};

/// Build the capability set for a built-in worker.
pub fn builtin_worker(kind: BuiltinWorker, server_name: &str) -> CapabilitySet {
    match kind {
        BuiltinWorker::Utility => utility::capabilities(server_name),
        BuiltinWorker::DemoTrains => demo_trains::capabilities(server_name),
        BuiltinWorker::LiveTrains => live_trains::capabilities(server_name),
        BuiltinWorker::Hotels => hotels::capabilities(server_name),
    }
}

pub(crate) fn required_str<'a>(
    arguments: &'a serde_json::Value,
    key: &str,
) -> Result<&'a str, CapabilityError> {
    arguments[key]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CapabilityError::InvalidArguments(format!("Missing '{key}' argument")))
}

pub(crate) fn optional_str<'a>(arguments: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    arguments[key].as_str().map(str::trim).filter(|s| !s.is_empty())
}

/// Deterministic string hash for sample-data variation.
pub(crate) fn stable_hash(text: &str) -> u32 {
    text.to_lowercase()
        .bytes()
        .fold(2166136261u32, |acc, b| (acc ^ b as u32).wrapping_mul(16777619))
}
