use crate::registry::AgentRegistry;
use crate::transport::{DispatchMessage, TaskTransport};
use crate::types::{AgentInfo, Task, TaskType};
use odin_core::{OdinError, OdinResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Mapping from task type to the ordered agent pipeline that handles it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingTable {
    routes: HashMap<TaskType, Vec<String>>,
}

impl RoutingTable {
    /// An empty table; every type falls back to the default agent.
    pub fn new() -> Self {
        Self::default()
    }

    /// The baseline pipelines for the built-in task types.
    pub fn defaults() -> Self {
        let mut table = Self::new();
        table.set_route(TaskType::CodeWrite, ["retrieval", "dev", "approbation"]);
        table.set_route(TaskType::CodeModify, ["retrieval", "dev", "approbation"]);
        table.set_route(TaskType::CodeDebug, ["retrieval", "dev", "oracle_code"]);
        table.set_route(TaskType::CodeReview, ["retrieval", "review", "security"]);
        table.set_route(TaskType::Test, ["retrieval", "test", "oracle_code"]);
        table.set_route(TaskType::Analysis, ["retrieval", "analysis"]);
        table.set_route(TaskType::Question, ["retrieval", "explain"]);
        table
    }

    /// Set (or replace) the pipeline for a task type.
    pub fn set_route<I, S>(&mut self, task_type: impl Into<TaskType>, agents: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.routes
            .insert(task_type.into(), agents.into_iter().map(Into::into).collect());
    }

    /// Merge `other` into this table; its pipelines win on conflict.
    pub fn extend(&mut self, other: RoutingTable) {
        self.routes.extend(other.routes);
    }

    /// Pipeline configured for a task type.
    pub fn get(&self, task_type: &TaskType) -> Option<&[String]> {
        self.routes.get(task_type).map(Vec::as_slice)
    }

    /// Entries sorted by task type name.
    pub fn entries(&self) -> Vec<(&TaskType, &[String])> {
        let mut entries: Vec<(&TaskType, &[String])> = self
            .routes
            .iter()
            .map(|(task_type, agents)| (task_type, agents.as_slice()))
            .collect();
        entries.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        entries
    }

    /// Number of mapped task types.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no task type is mapped.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<K, V, S> FromIterator<(K, V)> for RoutingTable
where
    K: Into<TaskType>,
    V: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut table = RoutingTable::new();
        for (task_type, agents) in iter {
            table.set_route(task_type, agents);
        }
        table
    }
}

/// Maps tasks onto ready agents and hands them to the transport.
///
/// Route order is significant: it is the pipeline a task flows through
/// (retrieval before dev before approval), not a candidate pool.
pub struct Router {
    registry: Arc<AgentRegistry>,
    routes: RwLock<RoutingTable>,
    default_agent: String,
    transport: Arc<dyn TaskTransport>,
}

impl Router {
    /// Create a router over `registry` using the baseline routing table.
    pub fn new(
        registry: Arc<AgentRegistry>,
        transport: Arc<dyn TaskTransport>,
        default_agent: impl Into<String>,
    ) -> Self {
        Self::with_routes(registry, transport, default_agent, RoutingTable::defaults())
    }

    /// Create a router with an explicit routing table.
    pub fn with_routes(
        registry: Arc<AgentRegistry>,
        transport: Arc<dyn TaskTransport>,
        default_agent: impl Into<String>,
        routes: RoutingTable,
    ) -> Self {
        Self {
            registry,
            routes: RwLock::new(routes),
            default_agent: default_agent.into(),
            transport,
        }
    }

    /// The registry used for readiness checks.
    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    /// Agent used for unmapped task types.
    pub fn default_agent(&self) -> &str {
        &self.default_agent
    }

    /// The configured pipeline for a task type, before availability filtering.
    pub async fn pipeline_for(&self, task_type: &TaskType) -> Vec<String> {
        let routes = self.routes.read().await;
        match routes.get(task_type) {
            Some(agents) => agents.to_vec(),
            None => vec![self.default_agent.clone()],
        }
    }

    /// Ordered names of the ready agents that should handle `task`.
    ///
    /// Unmapped task types fall back to the default agent.
    pub async fn route(&self, task: &Task) -> OdinResult<Vec<String>> {
        let pipeline = self.pipeline_for(&task.task_type).await;
        let available = self.registry.ready_among(&pipeline).await;
        if available.is_empty() {
            debug!(task_id = %task.id, task_type = %task.task_type, pipeline = ?pipeline, "No ready agent in pipeline");
            return Err(OdinError::NoAvailableAgent {
                task_type: task.task_type.to_string(),
            });
        }
        Ok(available)
    }

    /// Route `task` and publish it for the selected agents.
    pub async fn submit_task(&self, task: &Task) -> OdinResult<Vec<String>> {
        let agents = self.route(task).await?;
        info!(
            task_id = %task.id,
            task_type = %task.task_type,
            agents = ?agents,
            "Task routed"
        );
        self.transport
            .publish(DispatchMessage {
                task_id: task.id.clone(),
                agents: agents.clone(),
                attempt: task.attempt(),
                task: task.clone(),
            })
            .await?;
        Ok(agents)
    }

    /// Forward a cancellation request to the transport.
    pub async fn cancel_task(&self, task_id: &str) -> OdinResult<()> {
        self.transport.cancel(task_id).await
    }

    /// Register or replace an agent by name.
    pub async fn register_agent(&self, info: AgentInfo) {
        self.registry.register(info).await;
    }

    /// Remove an agent by id.
    pub async fn unregister_agent(&self, agent_id: &str) -> Option<AgentInfo> {
        self.registry.unregister(agent_id).await
    }

    /// Snapshot of every known agent.
    pub async fn get_agents(&self) -> Vec<AgentInfo> {
        self.registry.snapshot().await
    }

    /// Snapshot of the current routing table.
    pub async fn routes(&self) -> RoutingTable {
        self.routes.read().await.clone()
    }

    /// Add or override pipelines. Routing decisions never mutate the table.
    pub async fn extend_routes(&self, routes: RoutingTable) {
        let mut table = self.routes.write().await;
        table.extend(routes);
    }
}
