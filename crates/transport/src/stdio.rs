//! Child-process worker connection over line-delimited JSON-RPC.
//!
//! The child is spawned on first use and then reused. Exchanges are
//! serialized through an async mutex, one request line answered by one
//! response line. If a caller gives up mid-exchange (the pool's timeout
//! drops the future), the session is left marked in flight and is replaced
//! by a fresh process on the next call, so a late answer can never be read
//! as the reply to a later request. Replies to earlier ids are skipped; any
//! other id mismatch fails the exchange and resets the process.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use wayfarer_core::error::TransportError;
use wayfarer_core::{CapabilitySpec, RpcRequest, RpcResponse, WorkerId};

use crate::connection::{self, WorkerConnection};

pub struct StdioConnection {
    id: WorkerId,
    command: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    session: Mutex<Option<Session>>,
    next_request: AtomicU64,
}

struct Session {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    in_flight: bool,
}

impl StdioConnection {
    pub fn new(
        id: WorkerId,
        command: impl Into<String>,
        args: Vec<String>,
        env: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id,
            command: command.into(),
            args,
            env,
            session: Mutex::new(None),
            next_request: AtomicU64::new(1),
        }
    }

    /// Whether a child process is currently running for this worker.
    pub async fn is_running(&self) -> bool {
        self.session.lock().await.is_some()
    }

    fn unreachable(&self, reason: impl Into<String>) -> TransportError {
        TransportError::WorkerUnreachable {
            worker: self.id.to_string(),
            reason: reason.into(),
        }
    }

    fn spawn(&self) -> Result<Session, TransportError> {
        info!(worker = %self.id, command = %self.command, "Starting worker process");
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .envs(&self.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.unreachable(format!("failed to start '{}': {e}", self.command)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.unreachable("worker stdin is not piped"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| self.unreachable("worker stdout is not piped"))?;

        Ok(Session {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            in_flight: false,
        })
    }

    async fn exchange(&self, request: &RpcRequest) -> Result<RpcResponse, TransportError> {
        let mut guard = self.session.lock().await;

        if guard.as_ref().is_some_and(|s| s.in_flight) {
            warn!(worker = %self.id, "Previous exchange was abandoned, restarting worker");
            if let Some(mut stale) = guard.take() {
                let _ = stale.child.start_kill();
            }
        }

        let session = match guard.take() {
            Some(session) => session,
            None => self.spawn()?,
        };
        let session = guard.insert(session);

        session.in_flight = true;
        let outcome = self.round_trip(session, request).await;
        session.in_flight = false;

        // A failed exchange leaves the stream in an unknown state.
        if outcome.is_err() {
            if let Some(mut broken) = guard.take() {
                let _ = broken.child.start_kill();
            }
        }
        outcome
    }

    async fn round_trip(
        &self,
        session: &mut Session,
        request: &RpcRequest,
    ) -> Result<RpcResponse, TransportError> {
        let mut line = serde_json::to_string(request)
            .map_err(|e| self.unreachable(format!("could not encode request: {e}")))?;
        line.push('\n');
        debug!(worker = %self.id, method = %request.method, id = request.id, "Sending request");

        session
            .stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| self.unreachable(format!("write failed: {e}")))?;
        session
            .stdin
            .flush()
            .await
            .map_err(|e| self.unreachable(format!("write failed: {e}")))?;

        loop {
            let reply = session
                .stdout
                .next_line()
                .await
                .map_err(|e| self.unreachable(format!("read failed: {e}")))?
                .ok_or_else(|| self.unreachable("worker closed its output"))?;
            let reply = reply.trim();
            if reply.is_empty() {
                continue;
            }
            let response: RpcResponse = serde_json::from_str(reply)
                .map_err(|e| self.malformed(format!("not a JSON-RPC response: {e}")))?;
            match response.id {
                Some(id) if id == request.id => return Ok(response),
                // Answers to earlier requests: duplicates or late replies.
                Some(id) if id < request.id => {
                    warn!(worker = %self.id, expected = request.id, got = id, "Discarding stale response");
                }
                other => {
                    return Err(self.malformed(format!(
                        "expected response id {}, got {}",
                        request.id,
                        other.map_or_else(|| "none".to_string(), |id| id.to_string())
                    )));
                }
            }
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> TransportError {
        TransportError::MalformedWorkerResponse {
            worker: self.id.to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl WorkerConnection for StdioConnection {
    fn id(&self) -> &WorkerId {
        &self.id
    }

    async fn list_capabilities(&self) -> Result<Vec<CapabilitySpec>, TransportError> {
        let id = self.next_request.fetch_add(1, Ordering::Relaxed);
        let response = self.exchange(&RpcRequest::list(id)).await?;
        connection::expect_tool_list(&self.id, id, response)
    }

    async fn call(
        &self,
        capability: &str,
        arguments: serde_json::Value,
    ) -> Result<String, TransportError> {
        let id = self.next_request.fetch_add(1, Ordering::Relaxed);
        let response = self.exchange(&RpcRequest::call(id, capability, arguments)).await?;
        connection::expect_text(&self.id, id, response)
    }

    async fn shutdown(&self) {
        if let Some(mut session) = self.session.lock().await.take() {
            info!(worker = %self.id, "Stopping worker process");
            if let Err(e) = session.child.kill().await {
                debug!(worker = %self.id, error = %e, "Worker process already gone");
            }
        }
    }
}
