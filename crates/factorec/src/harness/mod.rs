//! Concurrent task harness.
//!
//! Independent training runs are pushed into a [`TaskQueue`] up front, then
//! a [`TaskHarness`] starts a fixed pool of workers that each pop a task,
//! run it to completion and pop the next, until the queue is drained. Tasks
//! share nothing mutable: the queue channel is the only synchronization
//! point. Each finished task's output is sent back to the driver and
//! collected in a [`HarnessReport`].
//!
//! A panic inside a task ends only the worker that ran it. The task is
//! lost, the worker is counted in [`HarnessReport::panicked_workers`], and
//! the remaining workers keep draining the queue.
//!
//! ```
//! use factorec::harness::{FnTask, TaskHarness, TaskQueue};
//!
//! let mut queue = TaskQueue::new();
//! for n in 1..=4u64 {
//!     queue.push(FnTask::new(format!("square-{n}"), move || n * n));
//! }
//! let report = TaskHarness::new(2).run(queue).unwrap();
//! assert_eq!(report.outputs().copied().collect::<Vec<_>>(), vec![1, 4, 9, 16]);
//! ```

mod grid;

pub use grid::ParamGrid;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::utils::resolve_workers;

// =============================================================================
// Task
// =============================================================================

/// One independent unit of work, typically a whole training run.
pub trait Task: Send {
    type Output: Send;

    /// Name used in logs and reports.
    fn name(&self) -> String;

    /// Run to completion.
    fn run(self) -> Self::Output;
}

/// A named closure as a [`Task`].
pub struct FnTask<F> {
    name: String,
    f: F,
}

impl<F> FnTask<F> {
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

impl<O: Send, F: FnOnce() -> O + Send> Task for FnTask<F> {
    type Output = O;

    fn name(&self) -> String {
        self.name.clone()
    }

    fn run(self) -> O {
        (self.f)()
    }
}

// =============================================================================
// TaskQueue
// =============================================================================

/// FIFO queue of tasks, filled before the harness starts.
pub struct TaskQueue<T> {
    sender: Sender<(usize, T)>,
    receiver: Receiver<(usize, T)>,
    pushed: usize,
}

impl<T: Task> TaskQueue<T> {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            pushed: 0,
        }
    }

    /// Append a task.
    pub fn push(&mut self, task: T) {
        // The receiver lives in `self`, so the channel is never disconnected here.
        let _ = self.sender.send((self.pushed, task));
        self.pushed += 1;
    }

    /// Number of tasks waiting.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Stop accepting tasks; workers see the end of the queue once drained.
    fn close(self) -> Receiver<(usize, T)> {
        self.receiver
    }
}

impl<T: Task> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Task> Extend<T> for TaskQueue<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for task in iter {
            self.push(task);
        }
    }
}

impl<T: Task> FromIterator<T> for TaskQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut queue = Self::new();
        queue.extend(iter);
        queue
    }
}

// =============================================================================
// Report
// =============================================================================

/// Outcome of one finished task.
#[derive(Debug, Clone)]
pub struct TaskResult<O> {
    /// Position of the task in the queue.
    pub id: usize,
    pub name: String,
    /// Worker that ran the task.
    pub worker: usize,
    pub elapsed: Duration,
    pub output: O,
}

/// Everything the harness observed, ordered by task id.
#[derive(Debug, Clone)]
pub struct HarnessReport<O> {
    pub results: Vec<TaskResult<O>>,
    /// Workers that terminated because a task panicked.
    pub panicked_workers: usize,
    /// Tasks left in the queue because every worker had terminated.
    pub unexecuted: usize,
}

impl<O> HarnessReport<O> {
    /// Outputs in queue order.
    pub fn outputs(&self) -> impl Iterator<Item = &O> {
        self.results.iter().map(|r| &r.output)
    }

    /// Returns true if every task ran to completion.
    pub fn is_complete(&self) -> bool {
        self.panicked_workers == 0 && self.unexecuted == 0
    }
}

/// Errors that can occur when starting the harness.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

// =============================================================================
// TaskHarness
// =============================================================================

/// Fixed-size worker pool draining a [`TaskQueue`].
#[derive(Debug, Clone)]
pub struct TaskHarness {
    n_workers: usize,
}

impl TaskHarness {
    /// Harness with `n_workers` workers (`0` = one per available core).
    pub fn new(n_workers: usize) -> Self {
        Self { n_workers }
    }

    /// Run every queued task and wait for all workers to finish.
    ///
    /// Never starts more workers than there are tasks.
    pub fn run<T: Task>(&self, queue: TaskQueue<T>) -> Result<HarnessReport<T::Output>, HarnessError> {
        let n_tasks = queue.len();
        let n_workers = resolve_workers(self.n_workers).min(n_tasks).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_workers)
            .thread_name(|i| format!("factorec-worker-{i}"))
            .build()?;

        let tasks = queue.close();
        let (result_tx, result_rx) = unbounded::<TaskResult<T::Output>>();
        let panicked = AtomicUsize::new(0);

        log::info!("running {} tasks on {} workers", n_tasks, n_workers);
        let started = Instant::now();

        pool.scope(|scope| {
            for worker in 0..n_workers {
                let tasks = &tasks;
                let results = result_tx.clone();
                let panicked = &panicked;
                scope.spawn(move |_| {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        drain(worker, tasks, &results);
                    }));
                    if let Err(payload) = outcome {
                        panicked.fetch_add(1, Ordering::Relaxed);
                        log::error!(
                            "worker {} terminated by a panicking task: {}",
                            worker,
                            panic_message(payload.as_ref())
                        );
                    }
                });
            }
        });
        drop(result_tx);

        let mut results: Vec<_> = result_rx.try_iter().collect();
        results.sort_by_key(|r| r.id);
        let report = HarnessReport {
            panicked_workers: panicked.into_inner(),
            unexecuted: tasks.try_iter().count(),
            results,
        };

        log::info!(
            "harness finished {} of {} tasks in {:.2?}",
            report.results.len(),
            n_tasks,
            started.elapsed()
        );
        if !report.is_complete() {
            log::warn!(
                "{} workers panicked, {} tasks never ran",
                report.panicked_workers,
                report.unexecuted
            );
        }
        Ok(report)
    }
}

/// Worker loop: pop, run, report, until the queue is empty.
fn drain<T: Task>(worker: usize, tasks: &Receiver<(usize, T)>, results: &Sender<TaskResult<T::Output>>) {
    while let Ok((id, task)) = tasks.try_recv() {
        let name = task.name();
        log::debug!("worker {} starts task {} ({})", worker, id, name);
        let started = Instant::now();
        let output = task.run();
        let elapsed = started.elapsed();
        log::debug!("worker {} finished {} in {:.2?}", worker, name, elapsed);
        // The driver holds the receiver until every worker has returned.
        let _ = results.send(TaskResult {
            id,
            name,
            worker,
            elapsed,
            output,
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
