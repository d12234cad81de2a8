use crate::config::AgentsConfig;
use crate::types::{AgentInfo, AgentOrigin, AgentStatus};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What a single [`AgentRegistry::refresh`] pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Configured agents added because they were missing.
    pub seeded: Vec<String>,
    /// Agents moved to [`AgentStatus::Error`] for a missed heartbeat.
    pub expired: Vec<String>,
    /// Discovered agents removed after staying silent past the eviction
    /// window. Configured names are kept in `error` instead.
    pub evicted: Vec<String>,
}

/// Known worker agents and their liveness, keyed by agent name.
///
/// Read-mostly: routing takes the read lock, while heartbeats and the
/// periodic refresh take the write lock. This state is independent from the
/// scheduler's lock so routing never waits on admission.
pub struct AgentRegistry {
    agents: RwLock<HashMap<String, AgentInfo>>,
    config: AgentsConfig,
}

impl AgentRegistry {
    /// Create a registry seeded with the configured agent names.
    pub fn new(config: AgentsConfig) -> Self {
        let agents = config
            .enabled
            .iter()
            .map(|name| (name.clone(), AgentInfo::configured(name.as_str())))
            .collect();
        Self {
            agents: RwLock::new(agents),
            config,
        }
    }

    /// Create a registry with no agents at all.
    pub fn empty(config: AgentsConfig) -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            config: AgentsConfig {
                enabled: Vec::new(),
                ..config
            },
        }
    }

    /// Settings this registry was built with.
    pub fn config(&self) -> &AgentsConfig {
        &self.config
    }

    /// Insert or replace the agent with this name.
    ///
    /// An agent restarting under the same logical name overwrites its
    /// previous entry.
    pub async fn register(&self, info: AgentInfo) {
        info!(id = %info.id, agent = %info.name, status = %info.status, "Agent registered");
        let mut agents = self.agents.write().await;
        agents.insert(info.name.clone(), info);
    }

    /// Remove the agent with this id. Returns the removed entry.
    pub async fn unregister(&self, agent_id: &str) -> Option<AgentInfo> {
        let mut agents = self.agents.write().await;
        let name = agents
            .values()
            .find(|agent| agent.id == agent_id)
            .map(|agent| agent.name.clone())?;
        let removed = agents.remove(&name);
        info!(id = %agent_id, agent = %name, "Agent unregistered");
        removed
    }

    /// Record a heartbeat, creating the agent on first sight.
    ///
    /// A heartbeat moves a configured agent under TTL supervision.
    pub async fn heartbeat(&self, name: &str, status: AgentStatus) {
        self.heartbeat_at(name, status, Utc::now()).await;
    }

    async fn heartbeat_at(&self, name: &str, status: AgentStatus, now: DateTime<Utc>) {
        let mut agents = self.agents.write().await;
        match agents.get_mut(name) {
            Some(agent) => {
                if agent.status != status {
                    debug!(agent = name, from = %agent.status, to = %status, "Agent status changed");
                }
                agent.status = status;
                agent.last_seen = now;
                agent.origin = AgentOrigin::Discovered;
            }
            None => {
                info!(agent = name, status = %status, "Agent discovered via heartbeat");
                let mut agent = AgentInfo::new(name).with_status(status);
                agent.last_seen = now;
                agents.insert(name.to_string(), agent);
            }
        }
    }

    /// Change an agent's status without touching `last_seen`.
    pub async fn set_status(&self, name: &str, status: AgentStatus) -> bool {
        let mut agents = self.agents.write().await;
        match agents.get_mut(name) {
            Some(agent) => {
                agent.status = status;
                true
            }
            None => false,
        }
    }

    /// Look up an agent by name.
    pub async fn get(&self, name: &str) -> Option<AgentInfo> {
        self.agents.read().await.get(name).cloned()
    }

    /// Whether the named agent can receive work.
    pub async fn is_ready(&self, name: &str) -> bool {
        self.agents
            .read()
            .await
            .get(name)
            .is_some_and(AgentInfo::is_ready)
    }

    /// Keep the names that belong to ready agents, preserving order.
    pub async fn ready_among(&self, names: &[String]) -> Vec<String> {
        let agents = self.agents.read().await;
        names
            .iter()
            .filter(|name| agents.get(name.as_str()).is_some_and(AgentInfo::is_ready))
            .cloned()
            .collect()
    }

    /// Snapshot of every known agent, sorted by name.
    pub async fn snapshot(&self) -> Vec<AgentInfo> {
        let agents = self.agents.read().await;
        let mut list: Vec<AgentInfo> = agents.values().cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// Number of known agents.
    pub async fn len(&self) -> usize {
        self.agents.read().await.len()
    }

    /// Whether no agent is known.
    pub async fn is_empty(&self) -> bool {
        self.agents.read().await.is_empty()
    }

    /// Seed missing configured agents and apply heartbeat expiry.
    pub async fn refresh(&self) -> RefreshReport {
        self.refresh_at(Utc::now()).await
    }

    /// [`refresh`](Self::refresh) evaluated at an explicit instant.
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> RefreshReport {
        let ttl = chrono_duration(self.config.heartbeat_ttl());
        let eviction = chrono_duration(self.config.eviction_after());
        let mut report = RefreshReport::default();
        let mut agents = self.agents.write().await;

        for name in &self.config.enabled {
            if !agents.contains_key(name) {
                let mut agent = AgentInfo::configured(name.as_str());
                agent.last_seen = now;
                agents.insert(name.clone(), agent);
                report.seeded.push(name.clone());
            }
        }

        let pinned = &self.config.enabled;
        agents.retain(|name, agent| {
            if agent.origin == AgentOrigin::Configured {
                return true;
            }
            let silent_for = now - agent.last_seen;
            // Configured names stay registered so they are never reseeded as ready.
            if silent_for > eviction && !pinned.contains(name) {
                report.evicted.push(name.clone());
                return false;
            }
            if silent_for > ttl
                && !matches!(agent.status, AgentStatus::Error | AgentStatus::Stopped)
            {
                agent.status = AgentStatus::Error;
                report.expired.push(name.clone());
            }
            true
        });
        drop(agents);

        for name in &report.expired {
            warn!(agent = %name, "Agent missed heartbeat window, excluded from routing");
        }
        for name in &report.evicted {
            warn!(agent = %name, "Agent evicted after prolonged silence");
        }
        report
    }

    /// Run [`refresh`](Self::refresh) every `health_check_interval` until
    /// `cancel` fires.
    pub fn start(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let period = registry.config.health_check_interval();
            info!(interval_secs = period.as_secs(), "Starting agent health checks");
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Agent health checks stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        registry.refresh().await;
                    }
                }
            }
        })
    }
}

fn chrono_duration(duration: std::time::Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn config(enabled: &[&str]) -> AgentsConfig {
        AgentsConfig {
            enabled: enabled.iter().map(|s| s.to_string()).collect(),
            heartbeat_ttl: 10,
            eviction_after: 60,
            ..AgentsConfig::default()
        }
    }

    #[tokio::test]
    async fn test_seeded_from_config() {
        let registry = AgentRegistry::new(config(&["retrieval", "dev"]));
        assert_eq!(registry.len().await, 2);
        assert!(registry.is_ready("dev").await);
        assert_eq!(registry.get("dev").await.unwrap().id, "dev-1");
        assert!(AgentRegistry::empty(config(&["dev"])).is_empty().await);
    }

    #[tokio::test]
    async fn test_register_overwrites_by_name() {
        let registry = AgentRegistry::empty(config(&[]));
        registry.register(AgentInfo::new("dev").with_id("dev-a")).await;
        registry
            .register(
                AgentInfo::new("dev")
                    .with_id("dev-b")
                    .with_status(AgentStatus::Busy),
            )
            .await;

        assert_eq!(registry.len().await, 1);
        let dev = registry.get("dev").await.unwrap();
        assert_eq!(dev.id, "dev-b");
        assert_eq!(dev.status, AgentStatus::Busy);
    }

    #[tokio::test]
    async fn test_unregister_by_id() {
        let registry = AgentRegistry::empty(config(&[]));
        registry.register(AgentInfo::new("review").with_id("rev-7")).await;
        assert!(registry.unregister("review").await.is_none());
        assert_eq!(registry.unregister("rev-7").await.unwrap().name, "review");
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_ready_among_preserves_order() {
        let registry = AgentRegistry::empty(config(&[]));
        for name in ["security", "retrieval", "review"] {
            registry.register(AgentInfo::new(name)).await;
        }
        registry.set_status("review", AgentStatus::Paused).await;

        let names: Vec<String> = ["retrieval", "review", "security", "ghost"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(registry.ready_among(&names).await, vec!["retrieval", "security"]);
    }

    #[tokio::test]
    async fn test_heartbeat_discovers_agent() {
        let registry = AgentRegistry::empty(config(&[]));
        registry.heartbeat("test", AgentStatus::Initializing).await;
        let agent = registry.get("test").await.unwrap();
        assert_eq!(agent.status, AgentStatus::Initializing);
        assert_eq!(agent.origin, AgentOrigin::Discovered);

        registry.heartbeat("test", AgentStatus::Ready).await;
        assert!(registry.is_ready("test").await);
    }

    #[tokio::test]
    async fn test_missed_heartbeat_expires_then_evicts() {
        let registry = AgentRegistry::empty(config(&[]));
        let start = Utc::now();
        registry.heartbeat_at("dev", AgentStatus::Ready, start).await;

        let report = registry.refresh_at(start + Duration::seconds(5)).await;
        assert!(report.expired.is_empty());
        assert!(registry.is_ready("dev").await);

        let report = registry.refresh_at(start + Duration::seconds(11)).await;
        assert_eq!(report.expired, vec!["dev"]);
        assert_eq!(registry.get("dev").await.unwrap().status, AgentStatus::Error);

        // A fresh heartbeat revives the agent.
        registry
            .heartbeat_at("dev", AgentStatus::Ready, start + Duration::seconds(12))
            .await;
        assert!(registry.is_ready("dev").await);

        let report = registry.refresh_at(start + Duration::seconds(80)).await;
        assert_eq!(report.evicted, vec!["dev"]);
        assert!(registry.get("dev").await.is_none());
    }

    #[tokio::test]
    async fn test_configured_agents_exempt_and_reseeded() {
        let registry = AgentRegistry::new(config(&["dev"]));
        let later = Utc::now() + Duration::seconds(3600);

        let report = registry.refresh_at(later).await;
        assert_eq!(report, RefreshReport::default());
        assert!(registry.is_ready("dev").await);

        registry.unregister("dev-1").await;
        let report = registry.refresh_at(later).await;
        assert_eq!(report.seeded, vec!["dev"]);
        assert!(registry.is_ready("dev").await);
    }

    #[tokio::test]
    async fn test_silent_configured_agent_stays_out_of_routing() {
        let registry = AgentRegistry::new(config(&["dev"]));
        let start = Utc::now();
        registry.heartbeat_at("dev", AgentStatus::Ready, start).await;

        let report = registry.refresh_at(start + Duration::seconds(11)).await;
        assert_eq!(report.expired, vec!["dev"]);
        assert!(!registry.is_ready("dev").await);

        for secs in [61, 91, 100_000] {
            let report = registry.refresh_at(start + Duration::seconds(secs)).await;
            assert!(report.evicted.is_empty());
            assert!(report.seeded.is_empty());
            let dev = registry.get("dev").await.unwrap();
            assert_eq!(dev.status, AgentStatus::Error);
            assert_eq!(dev.origin, AgentOrigin::Discovered);
        }

        registry
            .heartbeat_at("dev", AgentStatus::Ready, start + Duration::seconds(100_001))
            .await;
        assert!(registry.is_ready("dev").await);
    }

    #[tokio::test]
    async fn test_start_stops_on_cancel() {
        let registry = Arc::new(AgentRegistry::new(config(&["dev"])));
        let cancel = CancellationToken::new();
        let handle = registry.start(cancel.clone());
        cancel.cancel();
        handle.await.unwrap();
    }
}
