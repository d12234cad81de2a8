//! Contract between the orchestrator and the durable queue that carries work
//! to worker processes.
//!
//! The core publishes a [`DispatchMessage`] per routed task and consumes a
//! [`CompletionSignal`] per finished attempt. Everything about how those
//! messages travel belongs to the [`TaskTransport`] implementation.

use crate::types::Task;
use async_trait::async_trait;
use odin_core::{OdinError, OdinResult};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// A routed task handed to the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchMessage {
    /// Id of the dispatched task.
    pub task_id: String,
    /// Agent pipeline, in the order the agents should handle the task.
    pub agents: Vec<String>,
    /// 1-based attempt number; echoed back in the completion signal.
    pub attempt: u32,
    /// Full task descriptor.
    pub task: Task,
}

/// Outcome of one attempt, reported by a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSignal {
    /// Id of the finished task.
    pub task_id: String,
    /// Whether the attempt succeeded.
    pub success: bool,
    /// Worker error for a failed attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Attempt this signal answers. Signals for a stale attempt are ignored;
    /// `None` matches whichever attempt is running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
}

impl CompletionSignal {
    /// A successful completion.
    pub fn success(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            success: true,
            error: None,
            attempt: None,
        }
    }

    /// A failed completion carrying the worker error.
    pub fn failure(task_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            success: false,
            error: Some(error.into()),
            attempt: None,
        }
    }

    /// Bind the signal to a specific attempt.
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// `Ok(())` on success, otherwise the worker's error.
    pub fn into_result(self) -> OdinResult<()> {
        if self.success {
            Ok(())
        } else {
            Err(OdinError::Worker(
                self.error
                    .unwrap_or_else(|| "worker reported failure".to_string()),
            ))
        }
    }
}

/// Publishes routed tasks to workers.
#[async_trait]
pub trait TaskTransport: Send + Sync {
    /// Publish a task for the agents named in the message.
    async fn publish(&self, message: DispatchMessage) -> OdinResult<()>;

    /// Ask workers to stop a dispatched task.
    ///
    /// The default does nothing: not every transport can reach a running
    /// worker, and the scheduler frees the concurrency slot either way.
    async fn cancel(&self, task_id: &str) -> OdinResult<()> {
        tracing::debug!(task_id, "Transport has no cancellation channel");
        Ok(())
    }
}

/// Commands emitted by a [`ChannelTransport`].
#[derive(Debug, Clone)]
pub enum TransportCommand {
    /// Execute a task.
    Dispatch(DispatchMessage),
    /// Stop a task.
    Cancel(String),
}

/// In-process transport backed by a bounded `mpsc` channel.
///
/// The receiving half is handed to whatever bridges to workers (a test
/// harness, or the CLI's JSON-lines bridge).
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<TransportCommand>,
}

impl ChannelTransport {
    /// Create the transport and the receiver for its commands.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<TransportCommand>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl TaskTransport for ChannelTransport {
    async fn publish(&self, message: DispatchMessage) -> OdinResult<()> {
        self.tx
            .send(TransportCommand::Dispatch(message))
            .await
            .map_err(|_| OdinError::Transport("dispatch channel closed".into()))
    }

    async fn cancel(&self, task_id: &str) -> OdinResult<()> {
        self.tx
            .send(TransportCommand::Cancel(task_id.to_string()))
            .await
            .map_err(|_| OdinError::Transport("dispatch channel closed".into()))
    }
}
