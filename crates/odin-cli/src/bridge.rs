//! JSON-lines bridge between the in-process transport and external workers.
//!
//! Dispatch and cancel commands are written to stdout, one JSON object per
//! line. Workers answer on stdin with completion signals or heartbeats.

use odin_core::OdinResult;
use odin_orchestrator::{
    AgentRegistry, AgentStatus, CompletionSignal, DispatchMessage, Scheduler, TransportCommand,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Outbound<'a> {
    Dispatch(&'a DispatchMessage),
    Cancel { task_id: &'a str },
}

/// A line read from a worker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Inbound {
    /// `{"heartbeat": "dev", "status": "busy"}`
    Heartbeat {
        heartbeat: String,
        #[serde(default = "ready")]
        status: AgentStatus,
    },
    /// `{"task_id": "t1", "success": true}`
    Completion(CompletionSignal),
}

fn ready() -> AgentStatus {
    AgentStatus::Ready
}

pub fn encode(command: &TransportCommand) -> OdinResult<String> {
    let line = match command {
        TransportCommand::Dispatch(message) => serde_json::to_string(&Outbound::Dispatch(message))?,
        TransportCommand::Cancel(task_id) => {
            serde_json::to_string(&Outbound::Cancel { task_id: task_id.as_str() })?
        }
    };
    Ok(line)
}

pub fn decode(line: &str) -> OdinResult<Inbound> {
    Ok(serde_json::from_str(line)?)
}

/// Write transport commands to stdout until the channel closes or `cancel` fires.
pub fn spawn_writer(
    mut commands: mpsc::Receiver<TransportCommand>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        loop {
            let command = tokio::select! {
                _ = cancel.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };
            let line = match encode(&command) {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Failed to encode transport command");
                    continue;
                }
            };
            let written = async {
                stdout.write_all(line.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await
            };
            if let Err(e) = written.await {
                warn!(error = %e, "Worker output closed");
                break;
            }
        }
        debug!("Dispatch writer stopped");
    })
}

/// Read worker lines from stdin until EOF or `cancel` fires.
pub fn spawn_reader(
    scheduler: Arc<Scheduler>,
    registry: Arc<AgentRegistry>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => break,
                line = lines.next_line() => line,
            };
            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("Worker input closed");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read worker input");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match decode(&line) {
                Ok(Inbound::Completion(signal)) => {
                    let task_id = signal.task_id.clone();
                    if !scheduler.deliver(signal).await {
                        debug!(task_id = %task_id, "Completion signal not delivered");
                    }
                }
                Ok(Inbound::Heartbeat { heartbeat, status }) => {
                    registry.heartbeat(&heartbeat, status).await;
                }
                Err(e) => warn!(error = %e, "Ignoring malformed worker line"),
            }
        }
    })
}
