//! Deferred commit tasks
//!
//! A commit is never run inline with the request that caused it. It is
//! posted to a [`CommitExecutor`] as a [`CommitTask`] that holds only a weak
//! reference to its surface plus the scheduler generation it was posted
//! under. A task whose surface is gone, or whose generation was cancelled,
//! does nothing when it runs.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Weak;

/// Something that runs commits.
pub trait CommitTarget {
    fn run_commit(&self, ticket: u64);
}

pub struct CommitTask {
    target: Weak<dyn CommitTarget>,
    ticket: u64,
}

impl CommitTask {
    pub fn new(target: Weak<dyn CommitTarget>, ticket: u64) -> Self {
        Self { target, ticket }
    }

    pub fn run(self) {
        match self.target.upgrade() {
            Some(target) => target.run_commit(self.ticket),
            None => tracing::trace!("Dropping commit task for a released surface"),
        }
    }
}

/// Where commit tasks run.
///
/// `post` must not run the task before returning; a commit requested from
/// inside a commit has to become a separate task.
pub trait CommitExecutor {
    fn post(&self, task: CommitTask);
}

/// Same-thread FIFO executor, drained by the event loop.
#[derive(Default)]
pub struct TaskQueue {
    tasks: RefCell<VecDeque<CommitTask>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Run the tasks queued so far. Tasks posted while running wait for the
    /// next call. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let batch = self.tasks.borrow().len();
        let mut ran = 0;
        while ran < batch {
            let Some(task) = self.tasks.borrow_mut().pop_front() else {
                break;
            };
            task.run();
            ran += 1;
        }
        ran
    }
}

impl CommitExecutor for TaskQueue {
    fn post(&self, task: CommitTask) {
        self.tasks.borrow_mut().push_back(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counter {
        runs: Cell<u32>,
        queue: Rc<TaskQueue>,
        repost: Cell<bool>,
        me: RefCell<Weak<Counter>>,
    }

    impl CommitTarget for Counter {
        fn run_commit(&self, _ticket: u64) {
            self.runs.set(self.runs.get() + 1);
            if self.repost.replace(false) {
                let me: Weak<dyn CommitTarget> = self.me.borrow().clone();
                self.queue.post(CommitTask::new(me, 0));
            }
        }
    }

    fn counter(queue: &Rc<TaskQueue>) -> Rc<Counter> {
        let counter = Rc::new(Counter {
            runs: Cell::new(0),
            queue: queue.clone(),
            repost: Cell::new(false),
            me: RefCell::new(Weak::new()),
        });
        *counter.me.borrow_mut() = Rc::downgrade(&counter);
        counter
    }

    #[test]
    fn test_reposted_tasks_wait_for_next_drain() {
        let queue = Rc::new(TaskQueue::new());
        let target = counter(&queue);
        target.repost.set(true);

        let weak: Weak<dyn CommitTarget> = Rc::downgrade(&target) as Weak<dyn CommitTarget>;
        queue.post(CommitTask::new(weak, 0));

        assert_eq!(queue.run_pending(), 1);
        assert_eq!(target.runs.get(), 1);
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.run_pending(), 1);
        assert_eq!(target.runs.get(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_orphaned_task_is_noop() {
        let queue = Rc::new(TaskQueue::new());
        let target = counter(&queue);
        let weak: Weak<dyn CommitTarget> = Rc::downgrade(&target) as Weak<dyn CommitTarget>;
        queue.post(CommitTask::new(weak, 0));
        drop(target);

        assert_eq!(queue.run_pending(), 1);
    }
}
