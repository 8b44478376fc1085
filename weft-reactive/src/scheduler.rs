//! Deferred task queue
//!
//! The scheduler is the macrotask queue behind every dispatcher-backed port.
//! Deferred deliveries are queued here and run in FIFO order when the host
//! drives the queue, so subscribing and then synchronously pushing never
//! re-enters the subscriber's call stack.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type Task = Box<dyn FnOnce() + Send>;

struct SchedulerInner {
    queue: Mutex<VecDeque<Task>>,
    executed: AtomicU64,
}

/// Shared handle to a FIFO task queue
///
/// Cloning is cheap; all clones feed the same queue. Tasks never run while
/// the queue lock is held, so a task may freely defer further tasks.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

/// Outcome of a bounded drain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Number of tasks executed
    pub executed: usize,
    /// Whether the queue was empty when the drain stopped
    pub idle: bool,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                queue: Mutex::new(VecDeque::new()),
                executed: AtomicU64::new(0),
            }),
        }
    }

    /// Queue a task at the back of the queue
    pub fn defer(&self, task: impl FnOnce() + Send + 'static) {
        self.inner.queue.lock().push_back(Box::new(task));
    }

    /// Number of queued tasks
    pub fn pending(&self) -> usize {
        self.inner.queue.lock().len()
    }

    pub fn is_idle(&self) -> bool {
        self.inner.queue.lock().is_empty()
    }

    /// Total number of tasks run by this queue
    pub fn executed(&self) -> u64 {
        self.inner.executed.load(Ordering::SeqCst)
    }

    /// Run the task at the front of the queue, if any
    pub fn run_once(&self) -> bool {
        let task = self.inner.queue.lock().pop_front();
        match task {
            Some(task) => {
                task();
                self.inner.executed.fetch_add(1, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Run the tasks that were queued when the tick began
    ///
    /// Tasks deferred while the tick runs wait for the next tick.
    pub fn tick(&self) -> usize {
        let budget = self.pending();
        let mut executed = 0;
        while executed < budget && self.run_once() {
            executed += 1;
        }
        executed
    }

    /// Run tasks until the queue is empty or `max_tasks` have run
    pub fn run_bounded(&self, max_tasks: usize) -> RunReport {
        let mut executed = 0;
        while executed < max_tasks && self.run_once() {
            executed += 1;
        }
        RunReport {
            executed,
            idle: self.is_idle(),
        }
    }

    /// Run tasks until the queue is empty
    ///
    /// A wiring cycle that keeps re-scheduling itself never drains; use
    /// [`Scheduler::run_bounded`] when the graph is not trusted.
    pub fn run_until_idle(&self) -> usize {
        let mut executed = 0;
        while self.run_once() {
            executed += 1;
        }
        tracing::trace!(executed, "scheduler idle");
        executed
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .field("executed", &self.executed())
            .finish()
    }
}
