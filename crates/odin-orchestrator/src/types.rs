use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Retry budget applied when a producer leaves `max_retries` unset.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Category of work, used as the routing key.
///
/// Unknown categories are preserved as [`TaskType::Other`] so that producers
/// can submit types the routing table does not map yet; those fall back to
/// the router's default agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskType {
    /// Write new code.
    CodeWrite,
    /// Modify existing code.
    CodeModify,
    /// Track down and fix a defect.
    CodeDebug,
    /// Review code for quality and security.
    CodeReview,
    /// Write or run tests.
    Test,
    /// Analyze a codebase or requirement.
    Analysis,
    /// Answer a question.
    Question,
    /// Any category without a built-in variant.
    Other(String),
}

impl TaskType {
    /// Wire name of this type (e.g. `code_write`).
    pub fn as_str(&self) -> &str {
        match self {
            TaskType::CodeWrite => "code_write",
            TaskType::CodeModify => "code_modify",
            TaskType::CodeDebug => "code_debug",
            TaskType::CodeReview => "code_review",
            TaskType::Test => "test",
            TaskType::Analysis => "analysis",
            TaskType::Question => "question",
            TaskType::Other(name) => name,
        }
    }
}

impl From<String> for TaskType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "code_write" => TaskType::CodeWrite,
            "code_modify" => TaskType::CodeModify,
            "code_debug" => TaskType::CodeDebug,
            "code_review" => TaskType::CodeReview,
            "test" => TaskType::Test,
            "analysis" => TaskType::Analysis,
            "question" => TaskType::Question,
            _ => TaskType::Other(value),
        }
    }
}

impl From<&str> for TaskType {
    fn from(value: &str) -> Self {
        TaskType::from(value.to_string())
    }
}

impl From<TaskType> for String {
    fn from(value: TaskType) -> Self {
        match value {
            TaskType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered task priority. Higher levels are dispatched first.
///
/// Serializes as its lowercase name. Deserializes from either the name or
/// the numeric level `0..=3`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Background work.
    Low = 0,
    /// The default level.
    #[default]
    Normal = 1,
    /// Ahead of normal work.
    High = 2,
    /// Dispatched before everything else.
    Critical = 3,
}

impl TaskPriority {
    /// Map a numeric level (0-3) to a priority, clamping anything above 3.
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => TaskPriority::Low,
            1 => TaskPriority::Normal,
            2 => TaskPriority::High,
            _ => TaskPriority::Critical,
        }
    }

    /// Numeric level of this priority.
    pub fn level(self) -> u8 {
        self as u8
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = String;

    /// Parse a case-insensitive name or a level from 0 to 3.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "normal" => Ok(TaskPriority::Normal),
            "high" => Ok(TaskPriority::High),
            "critical" => Ok(TaskPriority::Critical),
            other => other
                .parse::<u8>()
                .ok()
                .filter(|level| *level <= 3)
                .map(TaskPriority::from_level)
                .ok_or_else(|| format!("unknown priority '{value}'")),
        }
    }
}

impl<'de> Deserialize<'de> for TaskPriority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Level(u64),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Level(level) => u8::try_from(level)
                .ok()
                .filter(|level| *level <= 3)
                .map(TaskPriority::from_level)
                .ok_or_else(|| {
                    serde::de::Error::custom(format!("priority level out of range: {level}"))
                }),
            Repr::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskPriority::Low => write!(f, "low"),
            TaskPriority::Normal => write!(f, "normal"),
            TaskPriority::High => write!(f, "high"),
            TaskPriority::Critical => write!(f, "critical"),
        }
    }
}

/// A unit of work submitted by a producer.
///
/// The scheduler owns a task exclusively while it is queued or running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    #[serde(default)]
    pub description: String,
    /// Opaque payload forwarded to the worker.
    #[serde(default)]
    pub input: serde_json::Value,
    #[serde(default)]
    pub priority: TaskPriority,
    /// Ids that must be completed before this task is eligible.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// The task is never dispatched after this instant.
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    /// Queue ordering timestamp; set on enqueue.
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Earliest dispatch instant, set while a retry backs off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,
    #[serde(default)]
    pub retries: u32,
    /// Retries allowed after the first attempt. `None` (field absent) means
    /// the scheduler's default, [`DEFAULT_MAX_RETRIES`] unless configured.
    /// An explicit `0` is honored: the task gets a single attempt.
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(task_type: impl Into<TaskType>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task_type: task_type.into(),
            description: description.into(),
            input: serde_json::Value::Null,
            priority: TaskPriority::Normal,
            dependencies: Vec::new(),
            deadline: None,
            scheduled_at: None,
            not_before: None,
            retries: 0,
            max_retries: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn with_input(mut self, input: serde_json::Value) -> Self {
        self.input = input;
        self
    }

    /// Effective retry budget.
    pub fn retry_budget(&self) -> u32 {
        self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }

    /// Whether the deadline has passed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| now > deadline)
    }

    /// Whether a retry backoff still holds the task at `now`.
    pub fn is_backing_off(&self, now: DateTime<Utc>) -> bool {
        self.not_before.is_some_and(|at| at > now)
    }

    /// Attempt number of the next dispatch (1-based).
    pub fn attempt(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

/// Liveness state of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Initializing,
    Ready,
    Busy,
    Paused,
    Error,
    Stopped,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Initializing => write!(f, "initializing"),
            AgentStatus::Ready => write!(f, "ready"),
            AgentStatus::Busy => write!(f, "busy"),
            AgentStatus::Paused => write!(f, "paused"),
            AgentStatus::Error => write!(f, "error"),
            AgentStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// How the registry learned about an agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentOrigin {
    /// Seeded from the configured agent list; not subject to heartbeat expiry.
    Configured,
    /// Registered explicitly or discovered through a heartbeat.
    #[default]
    Discovered,
}

/// Registry entry for a worker agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub status: AgentStatus,
    pub last_seen: DateTime<Utc>,
    #[serde(default)]
    pub origin: AgentOrigin,
}

impl AgentInfo {
    /// A ready agent named `name` with the conventional `<name>-1` id.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("{name}-1"),
            name,
            capabilities: Vec::new(),
            status: AgentStatus::Ready,
            last_seen: Utc::now(),
            origin: AgentOrigin::Discovered,
        }
    }

    /// A ready agent seeded from configuration.
    pub fn configured(name: impl Into<String>) -> Self {
        Self {
            origin: AgentOrigin::Configured,
            ..Self::new(name)
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_ready(&self) -> bool {
        self.status == AgentStatus::Ready
    }
}
