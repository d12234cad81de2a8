use crate::types::Task;
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Heap entry. `seq` keeps insertion order among equal timestamps so the
/// ordering is total.
#[derive(Debug)]
struct QueuedTask {
    task: Task,
    seq: u64,
}

impl QueuedTask {
    fn key(&self) -> (crate::types::TaskPriority, chrono::DateTime<Utc>) {
        (
            self.task.priority,
            self.task.scheduled_at.unwrap_or(self.task.created_at),
        )
    }
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedTask {}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedTask {
    // BinaryHeap is a max-heap: the greatest entry is the highest priority,
    // then the earliest scheduled, then the first inserted.
    fn cmp(&self, other: &Self) -> Ordering {
        let (priority, scheduled_at) = self.key();
        let (other_priority, other_scheduled_at) = other.key();
        priority
            .cmp(&other_priority)
            .then_with(|| other_scheduled_at.cmp(&scheduled_at))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Pending tasks ordered by descending priority, then ascending
/// `scheduled_at`.
///
/// Push and pop are O(log n). Removal by id is a linear scan followed by a
/// re-heapify.
#[derive(Debug, Default)]
pub struct TaskQueue {
    heap: BinaryHeap<QueuedTask>,
    next_seq: u64,
}

impl TaskQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a task, stamping `scheduled_at` with the current time if unset.
    pub fn push(&mut self, mut task: Task) {
        if task.scheduled_at.is_none() {
            task.scheduled_at = Some(Utc::now());
        }
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.heap.push(QueuedTask { task, seq });
    }

    /// Extract the highest-priority, earliest-scheduled task.
    pub fn pop(&mut self) -> Option<Task> {
        self.heap.pop().map(|entry| entry.task)
    }

    /// The task `pop` would return next.
    pub fn peek(&self) -> Option<&Task> {
        self.heap.peek().map(|entry| &entry.task)
    }

    /// Remove a queued task by id, returning it if it was present.
    pub fn take(&mut self, id: &str) -> Option<Task> {
        if !self.contains(id) {
            return None;
        }
        let (mut matched, kept): (Vec<QueuedTask>, Vec<QueuedTask>) =
            std::mem::take(&mut self.heap)
                .into_vec()
                .into_iter()
                .partition(|entry| entry.task.id == id);
        self.heap = BinaryHeap::from(kept);
        matched.pop().map(|entry| entry.task)
    }

    /// Remove a queued task by id. Returns `false` if it was not queued.
    pub fn remove(&mut self, id: &str) -> bool {
        self.take(id).is_some()
    }

    /// Whether a task with this id is queued.
    pub fn contains(&self, id: &str) -> bool {
        self.heap.iter().any(|entry| entry.task.id == id)
    }

    /// Iterate over queued tasks in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.heap.iter().map(|entry| &entry.task)
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{TaskPriority, TaskType};
    use chrono::Duration;

    fn task(id: &str, priority: TaskPriority) -> Task {
        Task::new(TaskType::CodeWrite, id)
            .with_id(id)
            .with_priority(priority)
    }

    #[test]
    fn test_empty_queue() {
        let mut queue = TaskQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert!(queue.pop().is_none());
        assert!(queue.peek().is_none());
        assert!(!queue.remove("missing"));
    }

    #[test]
    fn test_push_stamps_scheduled_at() {
        let mut queue = TaskQueue::new();
        queue.push(task("a", TaskPriority::Normal));
        assert!(queue.peek().unwrap().scheduled_at.is_some());
    }

    #[test]
    fn test_push_keeps_existing_scheduled_at() {
        let mut queue = TaskQueue::new();
        let at = Utc::now() + Duration::seconds(30);
        let mut t = task("a", TaskPriority::Normal);
        t.scheduled_at = Some(at);
        queue.push(t);
        assert_eq!(queue.peek().unwrap().scheduled_at, Some(at));
    }

    #[test]
    fn test_pop_by_priority() {
        let mut queue = TaskQueue::new();
        queue.push(task("low", TaskPriority::Low));
        queue.push(task("critical", TaskPriority::Critical));
        queue.push(task("normal", TaskPriority::Normal));
        queue.push(task("high", TaskPriority::High));

        let order: Vec<String> = std::iter::from_fn(|| queue.pop()).map(|t| t.id).collect();
        assert_eq!(order, vec!["critical", "high", "normal", "low"]);
    }

    #[test]
    fn test_equal_priority_earlier_first() {
        let mut queue = TaskQueue::new();
        let now = Utc::now();

        let mut later = task("later", TaskPriority::High);
        later.scheduled_at = Some(now + Duration::milliseconds(100));
        let mut earlier = task("earlier", TaskPriority::High);
        earlier.scheduled_at = Some(now);

        queue.push(later);
        queue.push(earlier);

        assert_eq!(queue.pop().unwrap().id, "earlier");
        assert_eq!(queue.pop().unwrap().id, "later");
    }

    #[test]
    fn test_identical_timestamps_keep_insertion_order() {
        let mut queue = TaskQueue::new();
        let now = Utc::now();
        for id in ["first", "second", "third"] {
            let mut t = task(id, TaskPriority::Normal);
            t.scheduled_at = Some(now);
            queue.push(t);
        }
        assert_eq!(queue.pop().unwrap().id, "first");
        assert_eq!(queue.pop().unwrap().id, "second");
        assert_eq!(queue.pop().unwrap().id, "third");
    }

    #[test]
    fn test_remove_by_id() {
        let mut queue = TaskQueue::new();
        queue.push(task("a", TaskPriority::Critical));
        queue.push(task("b", TaskPriority::Normal));
        queue.push(task("c", TaskPriority::Low));

        assert!(queue.remove("a"));
        assert!(!queue.remove("a"));
        assert_eq!(queue.len(), 2);
        assert!(!queue.contains("a"));

        let order: Vec<String> = std::iter::from_fn(|| queue.pop()).map(|t| t.id).collect();
        assert_eq!(order, vec!["b", "c"]);
    }

    #[test]
    fn test_take_returns_task() {
        let mut queue = TaskQueue::new();
        queue.push(task("a", TaskPriority::High).with_max_retries(5));
        let taken = queue.take("a").unwrap();
        assert_eq!(taken.max_retries, Some(5));
        assert!(queue.is_empty());
    }
}
