//! FIFO queue of pending tasks.
//!
//! Population and draining are two separate phases: the runner fills the
//! queue through `&mut self` before any worker exists, then shares it behind
//! an `Arc` and workers only ever call [`TaskQueue::get_task`]. The exclusive
//! borrow is what makes `add` lock-free; dequeue takes the mutex for the
//! duration of one `pop_front`.
//!
//! A dequeued task is never handed out again, whatever its outcome.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::task::Task;

#[derive(Default)]
pub struct TaskQueue {
    tasks: Mutex<VecDeque<Box<dyn Task>>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail.
    pub fn add(&mut self, task: Box<dyn Task>) {
        self.tasks
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(task);
    }

    /// Remove and return the head, `None` once the queue is drained.
    /// Never blocks waiting for work.
    pub fn get_task(&self) -> Option<Box<dyn Task>> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock can only happen inside VecDeque itself,
    // which leaves the deque intact.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Box<dyn Task>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Extend<Box<dyn Task>> for TaskQueue {
    fn extend<I: IntoIterator<Item = Box<dyn Task>>>(&mut self, iter: I) {
        self.tasks
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(iter);
    }
}

impl FromIterator<Box<dyn Task>> for TaskQueue {
    fn from_iter<I: IntoIterator<Item = Box<dyn Task>>>(iter: I) -> Self {
        let mut queue = TaskQueue::new();
        queue.extend(iter);
        queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RunContext;
    use crate::task::TaskError;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Arc;

    struct Named(String);

    #[async_trait]
    impl Task for Named {
        fn task_name(&self) -> &str {
            &self.0
        }

        async fn process(&self, _ctx: &RunContext) -> Result<(), TaskError> {
            Ok(())
        }
    }

    fn named(n: usize) -> Box<dyn Task> {
        Box::new(Named(format!("task-{n}")))
    }

    #[test]
    fn single_consumer_sees_fifo_order() {
        let queue: TaskQueue = (0..3).map(named).collect();

        let order: Vec<String> = std::iter::from_fn(|| queue.get_task())
            .map(|t| t.task_name().to_string())
            .collect();

        assert_eq!(order, vec!["task-0", "task-1", "task-2"]);
    }

    #[test]
    fn empty_queue_returns_none_immediately() {
        let queue = TaskQueue::new();
        assert!(queue.is_empty());
        assert!(queue.get_task().is_none());
    }

    #[test]
    fn add_after_drain_is_delivered() {
        let mut queue = TaskQueue::new();
        queue.add(named(0));
        assert!(queue.get_task().is_some());
        assert!(queue.get_task().is_none());

        queue.add(named(1));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get_task().unwrap().task_name(), "task-1");
    }

    #[test]
    fn concurrent_dequeue_delivers_each_task_once() {
        const TASKS: usize = 2_000;
        let queue: Arc<TaskQueue> = Arc::new((0..TASKS).map(named).collect());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    let mut seen = Vec::new();
                    while let Some(task) = queue.get_task() {
                        seen.push(task.task_name().to_string());
                    }
                    seen
                })
            })
            .collect();

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.join().unwrap());
        }
        let unique: HashSet<_> = all.iter().cloned().collect();

        assert_eq!(all.len(), TASKS);
        assert_eq!(unique.len(), TASKS);
        assert!(queue.is_empty());
    }
}
