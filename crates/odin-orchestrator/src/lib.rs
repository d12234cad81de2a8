//! Task scheduling and routing core of the ODIN orchestrator.
//!
//! Producers hand [`Task`]s to the [`Scheduler`], which admits them in
//! priority order under a concurrency budget, holds back tasks whose
//! dependencies have not completed, drops tasks past their deadline, and
//! retries failed attempts with linear backoff. Each dispatched task is
//! routed by the [`Router`] to an ordered pipeline of ready agents and
//! published through a [`TaskTransport`].
//!
//! # Main types
//!
//! - [`Scheduler`]: Admission loop, running set, completion and retry handling.
//! - [`TaskQueue`]: Priority queue ordered by priority, then enqueue time.
//! - [`Router`]: Maps task types onto agent pipelines filtered by readiness.
//! - [`AgentRegistry`]: Known agents, heartbeats and liveness expiry.
//! - [`TaskTransport`]: Seam to the queue that carries work to workers.

/// Scheduler and agent settings.
pub mod config;
/// Task lifecycle events.
pub mod events;
/// Agent registry and heartbeat supervision.
pub mod registry;
/// Task type to agent pipeline routing.
pub mod router;
/// Priority scheduler with dependency gating and retries.
pub mod scheduler;
/// Priority task queue.
pub mod task_queue;
/// Dispatch and completion contract with workers.
pub mod transport;
/// Shared types (Task, TaskPriority, AgentInfo, etc.).
pub mod types;

pub use config::{AgentsConfig, SchedulerConfig};
pub use events::SchedulerEvent;
pub use registry::{AgentRegistry, RefreshReport};
pub use router::{Router, RoutingTable};
pub use scheduler::{Scheduler, SchedulerStatus};
pub use task_queue::TaskQueue;
pub use transport::{
    ChannelTransport, CompletionSignal, DispatchMessage, TaskTransport, TransportCommand,
};
pub use types::{
    AgentInfo, AgentOrigin, AgentStatus, Task, TaskPriority, TaskType, DEFAULT_MAX_RETRIES,
};
