mod bridge;
mod config;

use clap::{Parser, Subcommand};
use config::{OdinConfig, DEFAULT_CONFIG_PATH};
use odin_orchestrator::{
    AgentRegistry, ChannelTransport, Router, Scheduler, Task, TaskPriority, TaskType,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const COMMAND_BUFFER: usize = 256;

#[derive(Parser)]
#[command(name = "odin", version, about = "ODIN task scheduling and routing core")]
struct Cli {
    /// Path to config file (defaults to $ODIN_CONFIG, then odin.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler, exchanging JSON lines with workers over stdio
    Serve {
        /// JSON array of tasks to schedule at startup
        #[arg(long)]
        tasks: Option<PathBuf>,
    },
    /// Show version and effective configuration
    Status,
    /// Show the effective routing table
    Routes,
    /// Build task descriptors
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Print the descriptor a producer would submit
    Submit {
        /// What the task should accomplish
        description: String,
        /// Task type (e.g. code_write, test, question)
        #[arg(long = "type", default_value = "code_write")]
        task_type: String,
        /// low, normal, high, critical or 0-3
        #[arg(long, default_value = "normal", value_parser = parse_priority)]
        priority: TaskPriority,
        /// Id of a task that must complete first (repeatable)
        #[arg(long = "depends-on")]
        depends_on: Vec<String>,
        /// Retry budget
        #[arg(long)]
        max_retries: Option<u32>,
    },
}

fn parse_priority(value: &str) -> Result<TaskPriority, String> {
    value.parse()
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries the worker protocol.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.json);

    let config_path = cli
        .config
        .or_else(|| std::env::var_os("ODIN_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = OdinConfig::load(&config_path).map_err(|e| {
        anyhow::anyhow!("Failed to load config '{}': {e}", config_path.display())
    })?;

    match cli.command {
        Commands::Serve { tasks } => serve(config, tasks.as_deref()).await?,
        Commands::Status => print_status(&config, &config_path),
        Commands::Routes => print_routes(&config),
        Commands::Task { action } => match action {
            TaskAction::Submit {
                description,
                task_type,
                priority,
                depends_on,
                max_retries,
            } => {
                let mut task = Task::new(TaskType::from(task_type), description)
                    .with_priority(priority)
                    .with_dependencies(depends_on);
                if let Some(max_retries) = max_retries {
                    task = task.with_max_retries(max_retries);
                }
                println!("{}", serde_json::to_string_pretty(&task)?);
            }
        },
    }

    Ok(())
}

async fn serve(config: OdinConfig, tasks: Option<&Path>) -> anyhow::Result<()> {
    let registry = Arc::new(AgentRegistry::new(config.agents.clone()));
    let (transport, commands) = ChannelTransport::new(COMMAND_BUFFER);
    let router = Arc::new(Router::with_routes(
        Arc::clone(&registry),
        Arc::new(transport),
        config.agents.default_agent.clone(),
        config.routing_table(),
    ));
    let scheduler = Arc::new(Scheduler::new(config.orchestrator.clone(), router));
    let shutdown = CancellationToken::new();

    let writer = bridge::spawn_writer(commands, shutdown.clone());
    let reader = bridge::spawn_reader(
        Arc::clone(&scheduler),
        Arc::clone(&registry),
        shutdown.clone(),
    );
    let health = registry.start(shutdown.clone());
    let ticker = scheduler.start(shutdown.clone());

    if let Some(path) = tasks {
        let preloaded = preload(&scheduler, path).await?;
        info!(count = preloaded, path = %path.display(), "Tasks preloaded");
    }

    info!(
        max_concurrent = config.orchestrator.max_concurrent_tasks,
        agents = registry.len().await,
        default_agent = %config.agents.default_agent,
        "ODIN orchestrator running"
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    shutdown.cancel();

    let (ticker, health, writer) = tokio::join!(ticker, health, writer);
    for result in [ticker, health, writer] {
        if let Err(e) = result {
            warn!(error = %e, "Background task ended abnormally");
        }
    }
    // The stdin read cannot be interrupted; don't wait on it.
    reader.abort();

    let status = scheduler.status().await;
    info!(
        queued = status.queued,
        running = status.running,
        completed = status.completed,
        failed = status.failed,
        expired = status.expired,
        "Scheduler stopped"
    );
    Ok(())
}

async fn preload(scheduler: &Scheduler, path: &Path) -> anyhow::Result<usize> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        anyhow::anyhow!("Failed to read tasks file '{}': {e}", path.display())
    })?;
    let tasks: Vec<Task> = serde_json::from_str(&raw)?;
    let mut accepted = 0;
    for task in tasks {
        let task_id = task.id.clone();
        match scheduler.schedule(task).await {
            Ok(()) => accepted += 1,
            Err(e) => warn!(task_id = %task_id, error = %e, "Skipping preloaded task"),
        }
    }
    Ok(accepted)
}

fn print_status(config: &OdinConfig, path: &Path) {
    let orchestrator = &config.orchestrator;
    let agents = &config.agents;
    println!("odin {}", env!("CARGO_PKG_VERSION"));
    println!("config: {}", path.display());
    println!();
    println!("Scheduler:");
    println!("  max concurrent tasks: {}", orchestrator.max_concurrent_tasks);
    println!("  task timeout:         {}s", orchestrator.task_timeout);
    println!("  tick interval:        {}ms", orchestrator.tick_interval_ms);
    println!("  retry backoff:        {}ms", orchestrator.retry_backoff_ms);
    println!("  default max retries:  {}", orchestrator.default_max_retries);
    println!();
    println!("Agents:");
    println!("  enabled:              {}", agents.enabled.join(", "));
    println!("  default agent:        {}", agents.default_agent);
    println!("  health check:         {}s", agents.health_check_interval);
    println!("  heartbeat ttl:        {}s", agents.heartbeat_ttl);
    println!("  eviction after:       {}s", agents.eviction_after);
}

fn print_routes(config: &OdinConfig) {
    let table = config.routing_table();
    println!("Routing table:");
    for (task_type, agents) in table.entries() {
        println!("  {:<14} {}", task_type.as_str(), agents.join(" -> "));
    }
    println!("  {:<14} {}", "(other)", config.agents.default_agent);
}
