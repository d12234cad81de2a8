use odin_core::{OdinError, OdinResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Admission and retry settings for the [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Concurrency budget: the most tasks dispatched at once.
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,
    /// Seconds to wait for a completion signal before failing the attempt.
    #[serde(default = "default_task_timeout")]
    pub task_timeout: u64,
    /// Admission loop period.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Forward shift applied to a task deferred on unmet dependencies.
    #[serde(default = "default_requeue_delay_ms")]
    pub requeue_delay_ms: u64,
    /// Linear backoff unit: retry `n` waits `n * retry_backoff_ms`.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Retry budget for tasks submitted without one.
    #[serde(default = "default_max_retries")]
    pub default_max_retries: u32,
    /// Completed ids remembered for dependency checks, oldest evicted first.
    #[serde(default = "default_completed_capacity")]
    pub completed_capacity: usize,
}

fn default_max_concurrent_tasks() -> usize {
    10
}

fn default_task_timeout() -> u64 {
    300
}

fn default_tick_interval_ms() -> u64 {
    100
}

fn default_requeue_delay_ms() -> u64 {
    100
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_max_retries() -> u32 {
    crate::types::DEFAULT_MAX_RETRIES
}

fn default_completed_capacity() -> usize {
    10_000
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: default_max_concurrent_tasks(),
            task_timeout: default_task_timeout(),
            tick_interval_ms: default_tick_interval_ms(),
            requeue_delay_ms: default_requeue_delay_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
            default_max_retries: default_max_retries(),
            completed_capacity: default_completed_capacity(),
        }
    }
}

impl SchedulerConfig {
    /// Override the concurrency budget.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent_tasks = max;
        self
    }

    /// Completion wait per attempt.
    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout)
    }

    /// Admission loop period.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Forward shift for tasks blocked on dependencies.
    pub fn requeue_delay(&self) -> Duration {
        Duration::from_millis(self.requeue_delay_ms)
    }

    /// Backoff unit for the first retry.
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Reject settings that would stall admission.
    pub fn validate(&self) -> OdinResult<()> {
        if self.max_concurrent_tasks == 0 {
            return Err(OdinError::Config(
                "orchestrator.max_concurrent_tasks must be at least 1".into(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(OdinError::Config(
                "orchestrator.tick_interval_ms must be at least 1".into(),
            ));
        }
        if self.requeue_delay_ms == 0 {
            return Err(OdinError::Config(
                "orchestrator.requeue_delay_ms must be at least 1".into(),
            ));
        }
        if self.completed_capacity == 0 {
            return Err(OdinError::Config(
                "orchestrator.completed_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Agent discovery and liveness settings for the
/// [`AgentRegistry`](crate::AgentRegistry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    /// Agents assumed available without a heartbeat.
    #[serde(default = "default_enabled")]
    pub enabled: Vec<String>,
    /// Seconds between registry refreshes.
    #[serde(default = "default_health_check_interval")]
    pub health_check_interval: u64,
    /// Seconds without a heartbeat before an agent stops receiving work.
    #[serde(default = "default_heartbeat_ttl")]
    pub heartbeat_ttl: u64,
    /// Seconds without a heartbeat before an agent is dropped entirely.
    #[serde(default = "default_eviction_after")]
    pub eviction_after: u64,
    /// Agent used for task types missing from the routing table.
    #[serde(default = "default_agent")]
    pub default_agent: String,
}

fn default_enabled() -> Vec<String> {
    ["intake", "retrieval", "dev", "oracle_code"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_health_check_interval() -> u64 {
    30
}

fn default_heartbeat_ttl() -> u64 {
    90
}

fn default_eviction_after() -> u64 {
    300
}

fn default_agent() -> String {
    "dev".to_string()
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            health_check_interval: default_health_check_interval(),
            heartbeat_ttl: default_heartbeat_ttl(),
            eviction_after: default_eviction_after(),
            default_agent: default_agent(),
        }
    }
}

impl AgentsConfig {
    /// Period of the registry refresh loop.
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval)
    }

    /// Silence tolerated before an agent leaves routing.
    pub fn heartbeat_ttl(&self) -> Duration {
        Duration::from_secs(self.heartbeat_ttl)
    }

    /// Silence tolerated before an agent is forgotten.
    pub fn eviction_after(&self) -> Duration {
        Duration::from_secs(self.eviction_after)
    }

    /// Reject an empty default agent or an inverted TTL window.
    pub fn validate(&self) -> OdinResult<()> {
        if self.default_agent.trim().is_empty() {
            return Err(OdinError::Config("agents.default_agent must not be empty".into()));
        }
        if self.health_check_interval == 0 {
            return Err(OdinError::Config(
                "agents.health_check_interval must be at least 1".into(),
            ));
        }
        if self.eviction_after < self.heartbeat_ttl {
            return Err(OdinError::Config(format!(
                "agents.eviction_after ({}) must not be shorter than agents.heartbeat_ttl ({})",
                self.eviction_after, self.heartbeat_ttl
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.max_concurrent_tasks, 10);
        assert_eq!(config.task_timeout(), Duration::from_secs(300));
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.retry_backoff(), Duration::from_secs(1));
        assert_eq!(config.default_max_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = SchedulerConfig::default().with_max_concurrent(0);
        assert!(matches!(config.validate(), Err(OdinError::Config(_))));
    }

    #[test]
    fn test_agents_defaults() {
        let config = AgentsConfig::default();
        assert_eq!(config.enabled, vec!["intake", "retrieval", "dev", "oracle_code"]);
        assert_eq!(config.default_agent, "dev");
        assert_eq!(config.health_check_interval(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_agents_validation() {
        let config = AgentsConfig {
            default_agent: "  ".into(),
            ..AgentsConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AgentsConfig {
            heartbeat_ttl: 60,
            eviction_after: 30,
            ..AgentsConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SchedulerConfig =
            serde_json::from_str(r#"{"max_concurrent_tasks": 2}"#).unwrap();
        assert_eq!(config.max_concurrent_tasks, 2);
        assert_eq!(config.requeue_delay_ms, 100);
    }
}
