//! Core error definitions for the ODIN orchestrator.
//!
//! This crate provides the error type shared by the scheduling, routing and
//! CLI crates so that failures keep their identity as they cross crate
//! boundaries.
//!
//! # Main types
//!
//! - [`OdinError`]: Unified error enum for all ODIN subsystems.
//! - [`OdinResult`]: Convenience alias for `Result<T, OdinError>`.

use std::time::Duration;

// --- Error types ---

/// Top-level error type for the ODIN orchestrator.
///
/// Routing and admission failures are returned synchronously to callers.
/// Execution failures are recorded by the scheduler and surfaced through
/// its event stream instead.
#[derive(Debug, thiserror::Error)]
pub enum OdinError {
    /// No agent in the routing pipeline for this task type is ready.
    #[error("no available agents for task type: {task_type}")]
    NoAvailableAgent {
        /// The task type that could not be routed.
        task_type: String,
    },

    /// The task deadline passed before it could be dispatched.
    #[error("task expired before dispatch: {0}")]
    TaskExpired(String),

    /// The task failed on every allowed attempt.
    #[error("task {task_id} failed permanently: {reason}")]
    TaskPermanentFailure {
        /// The failed task.
        task_id: String,
        /// Error reported by the last attempt.
        reason: String,
    },

    /// A task with this id is already queued, running or completed.
    #[error("task already tracked: {0}")]
    DuplicateTask(String),

    /// Accepting the task would close a dependency cycle.
    #[error("dependency cycle detected at task: {0}")]
    DependencyCycle(String),

    /// The task is not known to the scheduler.
    #[error("task not found: {0}")]
    TaskNotFound(String),

    /// The message transport rejected or lost a message.
    #[error("transport error: {0}")]
    Transport(String),

    /// A worker reported that it could not execute the task.
    #[error("worker error: {0}")]
    Worker(String),

    /// A dispatched task produced no completion signal in time.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// An error in configuration parsing or validation.
    #[error("config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A TOML parse error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OdinError {
    /// Whether this error reflects a terminal task outcome rather than a
    /// condition the caller may retry.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OdinError::TaskExpired(_) | OdinError::TaskPermanentFailure { .. }
        )
    }
}

/// A convenience `Result` alias using [`OdinError`].
pub type OdinResult<T> = Result<T, OdinError>;
