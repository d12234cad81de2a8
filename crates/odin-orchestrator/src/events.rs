use serde::Serialize;
use std::time::Duration;

/// Task lifecycle events published by the scheduler.
///
/// Terminal outcomes (`Failed`, `Expired`) are only observable here; the
/// scheduler never re-surfaces them to the original producer. Checkpoint
/// and audit sinks subscribe through [`Scheduler::subscribe`](crate::Scheduler::subscribe).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SchedulerEvent {
    /// The task was accepted into the queue.
    Scheduled {
        /// The accepted task.
        task_id: String,
    },
    /// The task was routed and published to the transport.
    Dispatched {
        /// The dispatched task.
        task_id: String,
        /// Agent pipeline selected by the router.
        agents: Vec<String>,
        /// 1-based attempt number.
        attempt: u32,
    },
    /// The worker reported success.
    Completed {
        /// The completed task.
        task_id: String,
    },
    /// The attempt failed and the task was re-queued.
    Retrying {
        /// The retried task.
        task_id: String,
        /// Retry count after this failure.
        retry: u32,
        /// Backoff before the task becomes eligible again.
        #[serde(with = "millis")]
        delay: Duration,
        /// Error reported by the failed attempt.
        error: String,
    },
    /// Retries are exhausted; the task will not run again.
    Failed {
        /// The failed task.
        task_id: String,
        /// Error reported by the last attempt.
        reason: String,
    },
    /// The deadline passed before the task could be dispatched.
    Expired {
        /// The expired task.
        task_id: String,
    },
    /// The task was cancelled while queued or running.
    Cancelled {
        /// The cancelled task.
        task_id: String,
        /// Whether the task had already been dispatched.
        was_running: bool,
    },
}

impl SchedulerEvent {
    /// Id of the task the event refers to.
    pub fn task_id(&self) -> &str {
        match self {
            SchedulerEvent::Scheduled { task_id }
            | SchedulerEvent::Dispatched { task_id, .. }
            | SchedulerEvent::Completed { task_id }
            | SchedulerEvent::Retrying { task_id, .. }
            | SchedulerEvent::Failed { task_id, .. }
            | SchedulerEvent::Expired { task_id }
            | SchedulerEvent::Cancelled { task_id, .. } => task_id,
        }
    }

    /// Whether the task reached a final state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SchedulerEvent::Completed { .. }
                | SchedulerEvent::Failed { .. }
                | SchedulerEvent::Expired { .. }
                | SchedulerEvent::Cancelled { .. }
        )
    }
}

mod millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = SchedulerEvent::Retrying {
            task_id: "t1".into(),
            retry: 2,
            delay: Duration::from_secs(2),
            error: "worker crashed".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "retrying");
        assert_eq!(json["delay"], 2000);
        assert_eq!(json["task_id"], "t1");
    }

    #[test]
    fn test_terminal_events() {
        assert!(SchedulerEvent::Expired { task_id: "t".into() }.is_terminal());
        assert!(!SchedulerEvent::Scheduled { task_id: "t".into() }.is_terminal());
        assert_eq!(SchedulerEvent::Completed { task_id: "t9".into() }.task_id(), "t9");
    }
}
