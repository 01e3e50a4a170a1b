//! Transport client for Wayfarer workers.
//!
//! Every worker, in-process or child process, is reached through the
//! [`WorkerConnection`] trait and the same JSON-RPC exchange. The
//! [`WorkerPool`] owns the connections and bounds every call with a timeout.

pub mod connection;
pub mod local;
pub mod pool;
pub mod stdio;

pub use connection::WorkerConnection;
pub use local::LocalConnection;
pub use pool::{WorkerPool, build_from_config};
pub use stdio::StdioConnection;
