use crate::config::SchedulerConfig;
use crate::events::SchedulerEvent;
use crate::router::Router;
use crate::task_queue::TaskQueue;
use crate::transport::CompletionSignal;
use crate::types::Task;
use chrono::{DateTime, Utc};
use odin_core::{OdinError, OdinResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const EVENT_CAPACITY: usize = 1024;

/// Read-only snapshot of scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStatus {
    /// Tasks waiting in the queue.
    pub queued: usize,
    /// Tasks dispatched and awaiting completion.
    pub running: usize,
    /// Completed ids currently remembered.
    pub completed: usize,
    /// Configured concurrency budget.
    pub max_concurrent: usize,
    /// Tasks that exhausted their retries.
    pub failed: usize,
    /// Tasks dropped because their deadline passed while queued.
    pub expired: usize,
}

/// Completed ids, bounded with oldest-first eviction.
#[derive(Debug)]
struct CompletedSet {
    ids: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl CompletedSet {
    fn new(capacity: usize) -> Self {
        Self {
            ids: HashSet::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    fn insert(&mut self, id: String) {
        if !self.ids.insert(id.clone()) {
            return;
        }
        self.order.push_back(id);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                debug!(task_id = %oldest, "Evicting completed task id");
                self.ids.remove(&oldest);
            }
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

/// A dispatched task awaiting its completion signal.
struct RunningTask {
    task: Task,
    attempt: u32,
    cancel: CancellationToken,
    completion: Option<oneshot::Sender<CompletionSignal>>,
}

/// Everything guarded by the scheduler's single lock.
struct SchedulerState {
    queue: TaskQueue,
    running: HashMap<String, RunningTask>,
    completed: CompletedSet,
    failed: usize,
    expired: usize,
}

impl SchedulerState {
    fn is_tracked(&self, id: &str) -> bool {
        self.running.contains_key(id) || self.completed.contains(id) || self.queue.contains(id)
    }

    fn dependencies_met(&self, task: &Task) -> bool {
        task.dependencies
            .iter()
            .all(|dep| self.completed.contains(dep))
    }

    /// Whether accepting `task` closes a cycle through queued or running tasks.
    fn closes_cycle(&self, task: &Task) -> bool {
        let edges: HashMap<&str, &[String]> = self
            .queue
            .iter()
            .chain(self.running.values().map(|entry| &entry.task))
            .map(|t| (t.id.as_str(), t.dependencies.as_slice()))
            .collect();

        let mut stack: Vec<&str> = task.dependencies.iter().map(String::as_str).collect();
        let mut visited: HashSet<&str> = HashSet::new();
        while let Some(id) = stack.pop() {
            if id == task.id {
                return true;
            }
            if !visited.insert(id) {
                continue;
            }
            if let Some(deps) = edges.get(id) {
                stack.extend(deps.iter().map(String::as_str));
            }
        }
        false
    }
}

/// Priority scheduler with a concurrency budget, dependency gating,
/// deadlines and retry with linear backoff.
///
/// Queue, running map and completed set share one exclusive lock. Each
/// dispatched task gets its own activity that routes and publishes it, then
/// waits for the worker's [`CompletionSignal`].
///
/// # Example
///
/// ```ignore
/// let scheduler = Arc::new(Scheduler::new(SchedulerConfig::default(), router));
/// let shutdown = CancellationToken::new();
/// let handle = scheduler.start(shutdown.clone());
/// scheduler.schedule(Task::new(TaskType::CodeWrite, "add login")).await?;
/// ```
pub struct Scheduler {
    state: Mutex<SchedulerState>,
    router: Arc<Router>,
    config: SchedulerConfig,
    events: broadcast::Sender<SchedulerEvent>,
}

impl Scheduler {
    /// Create an idle scheduler. Nothing is dispatched until
    /// [`start`](Self::start) or [`process_queue`](Self::process_queue) runs.
    pub fn new(config: SchedulerConfig, router: Arc<Router>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(SchedulerState {
                queue: TaskQueue::new(),
                running: HashMap::new(),
                completed: CompletedSet::new(config.completed_capacity),
                failed: 0,
                expired: 0,
            }),
            router,
            config,
            events,
        }
    }

    /// Settings this scheduler was built with.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Router used for dispatch.
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Receive lifecycle events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SchedulerEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Enqueue a task for the next admission tick.
    ///
    /// Stamps `scheduled_at` and fills in the default retry budget. Fails if
    /// the id is already queued, running or completed, or if the task's
    /// dependencies lead back to itself.
    pub async fn schedule(&self, mut task: Task) -> OdinResult<()> {
        let mut state = self.state.lock().await;
        if state.is_tracked(&task.id) {
            return Err(OdinError::DuplicateTask(task.id));
        }
        if state.closes_cycle(&task) {
            warn!(task_id = %task.id, "Rejected task closing a dependency cycle");
            return Err(OdinError::DependencyCycle(task.id));
        }

        task.scheduled_at = Some(Utc::now());
        task.not_before = None;
        if task.max_retries.is_none() {
            task.max_retries = Some(self.config.default_max_retries);
        }

        debug!(
            task_id = %task.id,
            priority = %task.priority,
            dependencies = task.dependencies.len(),
            "Task scheduled"
        );
        self.emit(SchedulerEvent::Scheduled {
            task_id: task.id.clone(),
        });
        state.queue.push(task);
        Ok(())
    }

    /// Run one admission pass. Returns how many tasks were dispatched.
    ///
    /// Pops tasks in priority order while the concurrency budget allows.
    /// Expired tasks are dropped, tasks with unmet dependencies or a pending
    /// retry backoff are set aside and re-queued after the pass, and the
    /// rest are marked running and handed to their own dispatch activity.
    pub async fn process_queue(self: &Arc<Self>) -> usize {
        let now = Utc::now();
        let requeue_at = offset(now, self.config.requeue_delay());
        let mut launches = Vec::new();

        {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            let mut deferred = Vec::new();

            while state.running.len() < self.config.max_concurrent_tasks {
                let Some(mut task) = state.queue.pop() else {
                    break;
                };

                if task.is_expired(now) {
                    state.expired += 1;
                    warn!(task_id = %task.id, deadline = ?task.deadline, "Task expired");
                    self.emit(SchedulerEvent::Expired { task_id: task.id });
                    continue;
                }

                if !state.dependencies_met(&task) {
                    task.scheduled_at = Some(requeue_at);
                    deferred.push(task);
                    continue;
                }

                if task.is_backing_off(now) {
                    deferred.push(task);
                    continue;
                }

                let attempt = task.attempt();
                let cancel = CancellationToken::new();
                let (completion_tx, completion_rx) = oneshot::channel();
                state.running.insert(
                    task.id.clone(),
                    RunningTask {
                        task: task.clone(),
                        attempt,
                        cancel: cancel.clone(),
                        completion: Some(completion_tx),
                    },
                );
                launches.push((task, attempt, cancel, completion_rx));
            }

            for task in deferred {
                state.queue.push(task);
            }
        }

        let dispatched = launches.len();
        for (task, attempt, cancel, completion) in launches {
            let scheduler = Arc::clone(self);
            tokio::spawn(async move {
                scheduler.dispatch(task, attempt, cancel, completion).await;
            });
        }
        dispatched
    }

    /// One dispatch attempt: route and publish, then wait for the worker.
    async fn dispatch(
        self: Arc<Self>,
        task: Task,
        attempt: u32,
        cancel: CancellationToken,
        completion: oneshot::Receiver<CompletionSignal>,
    ) {
        let task_id = task.id.clone();
        if !self.is_current(&task_id, attempt).await {
            debug!(task_id = %task_id, attempt, "Attempt settled before publish");
            return;
        }
        info!(task_id = %task_id, attempt, "Executing task");

        let agents = match self.router.submit_task(&task).await {
            Ok(agents) => agents,
            Err(err) => {
                warn!(task_id = %task_id, attempt, error = %err, "Dispatch failed");
                self.finish(&task_id, Some(attempt), Err(err)).await;
                return;
            }
        };
        self.emit(SchedulerEvent::Dispatched {
            task_id: task_id.clone(),
            agents,
            attempt,
        });

        let timeout = self.config.task_timeout();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                if let Err(err) = self.router.cancel_task(&task_id).await {
                    warn!(task_id = %task_id, error = %err, "Failed to propagate cancellation");
                }
            }
            signal = completion => {
                let outcome = match signal {
                    Ok(signal) => signal.into_result(),
                    // Entry left the running map without a signal.
                    Err(_) => return,
                };
                self.finish(&task_id, Some(attempt), outcome).await;
            }
            _ = tokio::time::sleep(timeout) => {
                warn!(task_id = %task_id, attempt, timeout_secs = timeout.as_secs(), "Task timed out");
                self.finish(&task_id, Some(attempt), Err(OdinError::Timeout(timeout))).await;
            }
        }
    }

    /// Whether `attempt` is still the running attempt of `task_id`.
    async fn is_current(&self, task_id: &str, attempt: u32) -> bool {
        self.state
            .lock()
            .await
            .running
            .get(task_id)
            .is_some_and(|entry| entry.attempt == attempt)
    }

    /// Deliver a worker's completion signal to the waiting dispatch activity.
    ///
    /// Returns `false` if the task is not running, or if the signal names a
    /// different attempt than the one in flight.
    pub async fn deliver(&self, signal: CompletionSignal) -> bool {
        let mut state = self.state.lock().await;
        let Some(entry) = state.running.get_mut(&signal.task_id) else {
            debug!(task_id = %signal.task_id, "Completion for task that is not running");
            return false;
        };
        if signal.attempt.is_some_and(|attempt| attempt != entry.attempt) {
            debug!(
                task_id = %signal.task_id,
                attempt = ?signal.attempt,
                running_attempt = entry.attempt,
                "Ignoring completion for stale attempt"
            );
            return false;
        }
        match entry.completion.take() {
            Some(tx) => tx.send(signal).is_ok(),
            None => false,
        }
    }

    /// Record the outcome of a running task.
    ///
    /// Success adds the id to the completed set. Failure re-queues the task
    /// with linear backoff until its retry budget is spent, after which it
    /// is dropped and a [`SchedulerEvent::Failed`] is emitted. Returns
    /// `false` if the task was not running.
    pub async fn complete_task(&self, task_id: &str, outcome: OdinResult<()>) -> bool {
        self.finish(task_id, None, outcome).await
    }

    async fn finish(&self, task_id: &str, attempt: Option<u32>, outcome: OdinResult<()>) -> bool {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let matches_attempt = state
            .running
            .get(task_id)
            .is_some_and(|entry| attempt.map_or(true, |a| a == entry.attempt));
        if !matches_attempt {
            return false;
        }
        let Some(RunningTask { mut task, .. }) = state.running.remove(task_id) else {
            return false;
        };

        match outcome {
            Ok(()) => {
                info!(task_id = %task_id, "Task completed");
                state.completed.insert(task.id);
                self.emit(SchedulerEvent::Completed {
                    task_id: task_id.to_string(),
                });
            }
            Err(err) if task.retries < task.retry_budget() => {
                task.retries += 1;
                let delay = self.config.retry_backoff() * task.retries;
                let eligible_at = offset(Utc::now(), delay);
                task.scheduled_at = Some(eligible_at);
                task.not_before = Some(eligible_at);
                warn!(
                    task_id = %task_id,
                    retry = task.retries,
                    delay_ms = delay.as_millis(),
                    error = %err,
                    "Task failed, retrying"
                );
                self.emit(SchedulerEvent::Retrying {
                    task_id: task_id.to_string(),
                    retry: task.retries,
                    delay,
                    error: err.to_string(),
                });
                state.queue.push(task);
            }
            Err(err) => {
                state.failed += 1;
                let failure = OdinError::TaskPermanentFailure {
                    task_id: task_id.to_string(),
                    reason: err.to_string(),
                };
                error!(task_id = %task_id, retries = task.retries, error = %failure, "Task failed permanently");
                self.emit(SchedulerEvent::Failed {
                    task_id: task_id.to_string(),
                    reason: err.to_string(),
                });
            }
        }
        true
    }

    /// Cancel a queued or running task.
    ///
    /// A running task leaves the running set at once, freeing its slot, and
    /// its dispatch activity forwards the cancellation to the transport.
    /// Whether the worker actually stops is up to the transport.
    pub async fn cancel(&self, task_id: &str) -> bool {
        let mut state = self.state.lock().await;

        if let Some(entry) = state.running.remove(task_id) {
            entry.cancel.cancel();
            info!(task_id = %task_id, "Cancelled running task");
            self.emit(SchedulerEvent::Cancelled {
                task_id: task_id.to_string(),
                was_running: true,
            });
            return true;
        }

        if state.queue.remove(task_id) {
            info!(task_id = %task_id, "Cancelled queued task");
            self.emit(SchedulerEvent::Cancelled {
                task_id: task_id.to_string(),
                was_running: false,
            });
            return true;
        }

        false
    }

    /// Snapshot of queue, running and terminal counts.
    pub async fn status(&self) -> SchedulerStatus {
        let state = self.state.lock().await;
        SchedulerStatus {
            queued: state.queue.len(),
            running: state.running.len(),
            completed: state.completed.len(),
            max_concurrent: self.config.max_concurrent_tasks,
            failed: state.failed,
            expired: state.expired,
        }
    }

    /// Whether the task is dispatched and awaiting completion.
    pub async fn is_running(&self, task_id: &str) -> bool {
        self.state.lock().await.running.contains_key(task_id)
    }

    /// Whether the task is waiting in the queue.
    pub async fn is_queued(&self, task_id: &str) -> bool {
        self.state.lock().await.queue.contains(task_id)
    }

    /// Whether the task is in the completed set.
    pub async fn is_completed(&self, task_id: &str) -> bool {
        self.state.lock().await.completed.contains(task_id)
    }

    /// Ids of dispatched tasks, sorted.
    pub async fn running_ids(&self) -> Vec<String> {
        let state = self.state.lock().await;
        let mut ids: Vec<String> = state.running.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Run the admission loop every `tick_interval` until `cancel` fires.
    ///
    /// Dispatch activities already in flight keep waiting for their workers.
    pub fn start(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            info!(
                max_concurrent = scheduler.config.max_concurrent_tasks,
                "Starting task scheduler"
            );
            let mut ticker = tokio::time::interval(scheduler.config.tick_interval());
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Scheduler shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        scheduler.process_queue().await;
                    }
                }
            }
        })
    }

    /// Feed completion signals from a transport into [`deliver`](Self::deliver)
    /// until the channel closes or `cancel` fires.
    pub fn consume_completions(
        self: &Arc<Self>,
        mut signals: mpsc::Receiver<CompletionSignal>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    signal = signals.recv() => {
                        let Some(signal) = signal else { break };
                        let task_id = signal.task_id.clone();
                        if !scheduler.deliver(signal).await {
                            debug!(task_id = %task_id, "Completion signal not delivered");
                        }
                    }
                }
            }
        })
    }
}

fn offset(now: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(now)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::AgentsConfig;
    use crate::registry::AgentRegistry;
    use crate::transport::{ChannelTransport, TransportCommand};
    use crate::types::{AgentInfo, TaskPriority, TaskType};

    async fn scheduler(max: usize) -> (Arc<Scheduler>, mpsc::Receiver<TransportCommand>) {
        let registry = Arc::new(AgentRegistry::empty(AgentsConfig::default()));
        registry.register(AgentInfo::new("dev")).await;
        let (transport, rx) = ChannelTransport::new(64);
        let router = Arc::new(Router::new(registry, Arc::new(transport), "dev"));
        let config = SchedulerConfig {
            retry_backoff_ms: 0,
            ..SchedulerConfig::default().with_max_concurrent(max)
        };
        (Arc::new(Scheduler::new(config, router)), rx)
    }

    fn task(id: &str) -> Task {
        Task::new("build", id).with_id(id)
    }

    #[test]
    fn test_completed_set_evicts_oldest() {
        let mut set = CompletedSet::new(2);
        set.insert("a".into());
        set.insert("b".into());
        set.insert("b".into());
        set.insert("c".into());
        assert_eq!(set.len(), 2);
        assert!(!set.contains("a"));
        assert!(set.contains("b") && set.contains("c"));
    }

    #[tokio::test]
    async fn test_schedule_sets_defaults() {
        let (scheduler, _rx) = scheduler(1).await;
        scheduler.schedule(task("t1")).await.unwrap();
        let state = scheduler.state.lock().await;
        let queued = state.queue.peek().unwrap();
        assert!(queued.scheduled_at.is_some());
        assert_eq!(queued.max_retries, Some(3));
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let (scheduler, _rx) = scheduler(1).await;
        scheduler.schedule(task("t1")).await.unwrap();
        let err = scheduler.schedule(task("t1")).await.unwrap_err();
        assert!(matches!(err, OdinError::DuplicateTask(id) if id == "t1"));
    }

    #[tokio::test]
    async fn test_cycle_rejected() {
        let (scheduler, _rx) = scheduler(1).await;
        let err = scheduler
            .schedule(task("self").with_dependencies(["self"]))
            .await
            .unwrap_err();
        assert!(matches!(err, OdinError::DependencyCycle(_)));

        scheduler
            .schedule(task("b").with_dependencies(["a"]))
            .await
            .unwrap();
        scheduler
            .schedule(task("c").with_dependencies(["b"]))
            .await
            .unwrap();
        let err = scheduler
            .schedule(task("a").with_dependencies(["c"]))
            .await
            .unwrap_err();
        assert!(matches!(err, OdinError::DependencyCycle(id) if id == "a"));

        // Unknown dependencies are allowed; they may arrive later.
        scheduler
            .schedule(task("d").with_dependencies(["later"]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_blocked_task_deferred_once_per_tick() {
        let (scheduler, _rx) = scheduler(4).await;
        scheduler
            .schedule(task("blocked").with_priority(TaskPriority::Critical).with_dependencies(["missing"]))
            .await
            .unwrap();
        scheduler.schedule(task("ready").with_priority(TaskPriority::Low)).await.unwrap();

        assert_eq!(scheduler.process_queue().await, 1);
        assert!(scheduler.is_running("ready").await);
        assert!(scheduler.is_queued("blocked").await);
    }

    #[tokio::test]
    async fn test_complete_unknown_task_is_noop() {
        let (scheduler, _rx) = scheduler(1).await;
        assert!(!scheduler.complete_task("ghost", Ok(())).await);
        assert!(!scheduler.deliver(CompletionSignal::success("ghost")).await);
        assert_eq!(scheduler.status().await.completed, 0);
    }

    #[tokio::test]
    async fn test_retry_requeues_with_backoff_stamp() {
        let (scheduler, _rx) = scheduler(1).await;
        scheduler.schedule(task("t1").with_max_retries(1)).await.unwrap();
        scheduler.process_queue().await;

        assert!(
            scheduler
                .complete_task("t1", Err(OdinError::Worker("boom".into())))
                .await
        );
        {
            let state = scheduler.state.lock().await;
            let queued = state.queue.peek().unwrap();
            assert_eq!(queued.retries, 1);
            assert!(queued.not_before.is_some());
        }

        scheduler.process_queue().await;
        assert!(scheduler.is_running("t1").await);
        scheduler
            .complete_task("t1", Err(OdinError::Worker("boom".into())))
            .await;

        let status = scheduler.status().await;
        assert_eq!(status.queued, 0);
        assert_eq!(status.running, 0);
        assert_eq!(status.failed, 1);
    }

    #[tokio::test]
    async fn test_backoff_gates_dispatch() {
        let (scheduler, _rx) = scheduler(1).await;
        let mut t = task("t1");
        t.not_before = Some(Utc::now() + chrono::Duration::seconds(60));
        {
            let mut state = scheduler.state.lock().await;
            state.queue.push(t);
        }
        assert_eq!(scheduler.process_queue().await, 0);
        assert!(scheduler.is_queued("t1").await);
    }

    #[tokio::test]
    async fn test_stale_attempt_signal_ignored() {
        let (scheduler, _rx) = scheduler(1).await;
        scheduler.schedule(task("t1")).await.unwrap();
        scheduler.process_queue().await;

        assert!(
            !scheduler
                .deliver(CompletionSignal::success("t1").with_attempt(5))
                .await
        );
        assert!(scheduler.is_running("t1").await);
    }

    #[tokio::test]
    async fn test_settled_attempt_is_not_published() {
        let (scheduler, mut rx) = scheduler(2).await;
        let mut events = scheduler.subscribe();
        scheduler.schedule(task("done")).await.unwrap();
        scheduler.schedule(task("gone")).await.unwrap();
        assert_eq!(scheduler.process_queue().await, 2);

        // Both settle before their dispatch activities get to run.
        assert!(scheduler.complete_task("done", Ok(())).await);
        assert!(scheduler.cancel("gone").await);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert!(rx.try_recv().is_err());
        while let Ok(event) = events.try_recv() {
            assert!(!matches!(event, SchedulerEvent::Dispatched { .. }));
        }
        assert!(scheduler.is_completed("done").await);
    }

    #[tokio::test]
    async fn test_status_snapshot() {
        let (scheduler, _rx) = scheduler(2).await;
        for id in ["a", "b", "c"] {
            scheduler.schedule(task(id)).await.unwrap();
        }
        scheduler.process_queue().await;
        let status = scheduler.status().await;
        assert_eq!(
            status,
            SchedulerStatus {
                queued: 1,
                running: 2,
                completed: 0,
                max_concurrent: 2,
                failed: 0,
                expired: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_unroutable_task_counts_as_failed_attempt() {
        let (scheduler, _rx) = scheduler(1).await;
        let mut events = scheduler.subscribe();
        scheduler
            .schedule(Task::new(TaskType::CodeReview, "review").with_id("r1").with_max_retries(0))
            .await
            .unwrap();
        scheduler.process_queue().await;

        loop {
            match events.recv().await.unwrap() {
                SchedulerEvent::Failed { task_id, reason } => {
                    assert_eq!(task_id, "r1");
                    assert!(reason.contains("no available agents"));
                    break;
                }
                _ => continue,
            }
        }
        assert_eq!(scheduler.status().await.failed, 1);
    }
}
