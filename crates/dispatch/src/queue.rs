//! FIFO of extraction tasks that keeps the in-flight task visible.
//!
//! The worker peeks the head, processes it, and only then removes it, so a
//! snapshot always covers both pending and in-progress work. Duplicate
//! detection and status reporting both read from here.

use crate::task::ExtractionTask;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: Mutex<VecDeque<Arc<ExtractionTask>>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task to the tail.
    pub fn enqueue(&self, task: ExtractionTask) {
        self.tasks.lock().push_back(Arc::new(task));
    }

    /// Append a task unless one with the same root name is already visible.
    ///
    /// The check and the append happen under one lock, so two concurrent
    /// submissions of the same name cannot both get in. Returns `false`
    /// when the task was ignored.
    pub fn enqueue_unique(&self, task: ExtractionTask) -> bool {
        let mut tasks = self.tasks.lock();
        if tasks.iter().any(|t| t.root_name() == task.root_name()) {
            return false;
        }
        tasks.push_back(Arc::new(task));
        true
    }

    /// Whether a task with this root name is queued or in progress.
    pub fn contains(&self, root_name: &str) -> bool {
        self.tasks.lock().iter().any(|t| t.root_name() == root_name)
    }

    /// The head task, left in place.
    pub fn peek_head(&self) -> Option<Arc<ExtractionTask>> {
        self.tasks.lock().front().cloned()
    }

    /// Remove the head once the caller has finished processing it.
    pub fn remove_head(&self) -> Option<Arc<ExtractionTask>> {
        self.tasks.lock().pop_front()
    }

    /// Current tasks, oldest first.
    pub fn snapshot(&self) -> Vec<Arc<ExtractionTask>> {
        self.tasks.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn task(name: &str) -> ExtractionTask {
        let mut task = ExtractionTask::new(name, false);
        task.add_archive(format!("/local/{}", name), "/out");
        task
    }

    #[test]
    fn peek_does_not_remove() {
        let queue = TaskQueue::new();
        queue.enqueue(task("a"));

        assert_eq!(queue.peek_head().unwrap().root_name(), "a");
        assert_eq!(queue.peek_head().unwrap().root_name(), "a");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn removal_is_fifo() {
        let queue = TaskQueue::new();
        queue.enqueue(task("a"));
        queue.enqueue(task("b"));
        queue.enqueue(task("c"));

        let order: Vec<_> = std::iter::from_fn(|| queue.remove_head())
            .map(|t| t.root_name().to_string())
            .collect();

        assert_eq!(order, ["a", "b", "c"]);
        assert!(queue.peek_head().is_none());
    }

    #[test]
    fn snapshot_includes_the_head() {
        let queue = TaskQueue::new();
        queue.enqueue(task("a"));
        queue.enqueue(task("b"));
        let _in_progress = queue.peek_head();

        let names: Vec<_> = queue
            .snapshot()
            .iter()
            .map(|t| t.root_name().to_string())
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn enqueue_unique_ignores_visible_names() {
        let queue = TaskQueue::new();
        assert!(queue.enqueue_unique(task("a")));
        assert!(!queue.enqueue_unique(task("a")));
        assert!(queue.contains("a"));

        queue.remove_head();
        assert!(!queue.contains("a"));
        assert!(queue.enqueue_unique(task("a")));
    }

    #[test]
    fn concurrent_unique_submissions_admit_one() {
        let queue = Arc::new(TaskQueue::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.enqueue_unique(task("same")))
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|admitted| *admitted)
            .count();

        assert_eq!(admitted, 1);
        assert_eq!(queue.len(), 1);
    }
}
