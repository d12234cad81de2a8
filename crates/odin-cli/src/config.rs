use odin_core::{OdinError, OdinResult};
use odin_orchestrator::{AgentsConfig, RoutingTable, SchedulerConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_PATH: &str = "odin.toml";

/// Top-level `odin.toml` layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OdinConfig {
    #[serde(default)]
    pub orchestrator: SchedulerConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
    /// Pipelines added to, or replacing, the built-in routing table.
    #[serde(default)]
    pub routes: RoutingTable,
}

impl OdinConfig {
    /// Read the config file, falling back to defaults when it does not exist,
    /// then apply `ODIN_*` environment overrides and validate.
    pub fn load(path: &Path) -> OdinResult<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> OdinResult<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        debug!(path = %path.display(), routes = config.routes.len(), "Config loaded");
        Ok(config)
    }

    /// Apply overrides from `lookup` (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> OdinResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("ODIN_MAX_CONCURRENT_TASKS") {
            self.orchestrator.max_concurrent_tasks = parse_number("ODIN_MAX_CONCURRENT_TASKS", &value)?;
        }
        if let Some(value) = lookup("ODIN_TASK_TIMEOUT") {
            self.orchestrator.task_timeout = parse_number("ODIN_TASK_TIMEOUT", &value)?;
        }
        if let Some(value) = lookup("ODIN_DEFAULT_AGENT") {
            self.agents.default_agent = value.trim().to_string();
        }
        if let Some(value) = lookup("ODIN_AGENTS_ENABLED") {
            self.agents.enabled = value
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect();
        }
        Ok(())
    }

    pub fn validate(&self) -> OdinResult<()> {
        self.orchestrator.validate()?;
        self.agents.validate()
    }

    /// Built-in routes with the configured `[routes]` applied on top.
    pub fn routing_table(&self) -> RoutingTable {
        let mut table = RoutingTable::defaults();
        table.extend(self.routes.clone());
        table
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> OdinResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| OdinError::Config(format!("{key} must be a non-negative integer, got '{value}'")))
}
