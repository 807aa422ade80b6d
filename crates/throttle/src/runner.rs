//! Worker pool that drives a task set under a concurrency limit.
//!
//! `min(limit, n)` workers pull indices from a shared cursor. A worker only
//! claims its next task after the current one settled, which bounds the
//! number of in-flight tasks by `limit`. Every settled outcome is sent to a
//! single collector that owns the result slots, so results land by index
//! regardless of completion order.

use std::convert::Infallible;
use std::future::{self, Future};
use std::iter::Enumerate;
use std::panic;
use std::sync::{Arc, Mutex, PoisonError};
use std::vec::IntoIter;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{InvalidArgument, ThrottleError};
use crate::limit::Limit;
use crate::policy::FailurePolicy;

/// Shared claim state: the next unclaimed `(index, task)` pair.
type Cursor<F> = Arc<Mutex<Enumerate<IntoIter<F>>>>;

/// Settled outcomes flowing from workers to the collector.
type Outcomes<T, E> = mpsc::UnboundedSender<(usize, Result<T, E>)>;

/// Run `tasks` with at most `limit` in flight, returning values in input order.
///
/// The limit is validated before any task is invoked. On the first task
/// failure the call returns that failure without waiting for tasks still in
/// flight. Workers carry on in the background until every task has been
/// invoked, and their results are discarded (see [`FailurePolicy::Detach`]).
///
/// Must be called from within a tokio runtime.
pub async fn throttle_all<T, E, F, Fut>(
    limit: usize,
    tasks: impl IntoIterator<Item = F>,
) -> Result<Vec<T>, ThrottleError<E>>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let throttle = Throttle::try_new(limit)?;
    throttle.run(tasks).await.map_err(ThrottleError::Task)
}

/// A configured bounded scheduler. Holds no state between runs.
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    limit: Limit,
    policy: FailurePolicy,
}

impl Throttle {
    pub fn new(limit: Limit) -> Self {
        Self {
            limit,
            policy: FailurePolicy::default(),
        }
    }

    /// Validate a raw limit and build a scheduler from it.
    pub fn try_new(limit: usize) -> Result<Self, InvalidArgument> {
        Limit::new(limit).map(Self::new)
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn limit(&self) -> Limit {
        self.limit
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Run every task, returning values ordered by input index or the first
    /// failure to settle.
    pub async fn run<T, E, F, Fut>(&self, tasks: impl IntoIterator<Item = F>) -> Result<Vec<T>, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let tasks: Vec<F> = tasks.into_iter().collect();
        let total = tasks.len();
        if total == 0 {
            debug!(limit = %self.limit, "empty task set, nothing to schedule");
            return Ok(Vec::new());
        }

        let worker_count = self.limit.get().min(total);
        debug!(limit = %self.limit, tasks = total, workers = worker_count, "spawning workers");

        let cursor: Cursor<F> = Arc::new(Mutex::new(tasks.into_iter().enumerate()));
        let (tx, mut rx) = mpsc::unbounded_channel();

        // The first batch is claimed and invoked here, in index order, before
        // any worker gets polled.
        let mut workers: Vec<JoinHandle<()>> = Vec::with_capacity(worker_count);
        for worker in 0..worker_count {
            let Some((index, task)) = claim(&cursor) else {
                break;
            };
            debug!(worker, index, "task claimed");
            let running = task();
            workers.push(tokio::spawn(run_worker(
                worker,
                index,
                running,
                Arc::clone(&cursor),
                tx.clone(),
                self.policy,
            )));
        }
        drop(tx);

        let mut slots: Vec<Option<T>> = (0..total).map(|_| None).collect();
        let mut filled = 0;
        while filled < total {
            match rx.recv().await {
                Some((index, Ok(value))) => {
                    slots[index] = Some(value);
                    filled += 1;
                }
                Some((index, Err(err))) => {
                    warn!(
                        index,
                        settled = filled,
                        tasks = total,
                        policy = ?self.policy,
                        "task failed, returning first failure"
                    );
                    self.settle_failure(rx, workers).await;
                    return Err(err);
                }
                None => {
                    resume_worker_panic(workers).await;
                    // No worker panicked, so one was cancelled. Handles never
                    // leave this call and are only aborted after it returned,
                    // so the runtime is shutting down and drops this future.
                    warn!(settled = filled, tasks = total, "workers cancelled before all tasks settled");
                    match future::pending::<Infallible>().await {}
                }
            }
        }

        debug!(tasks = total, "all tasks settled");
        Ok(slots.into_iter().flatten().collect())
    }

    /// Apply the failure policy to workers still running after the outcome settled.
    async fn settle_failure<T, E>(
        &self,
        mut rx: mpsc::UnboundedReceiver<(usize, Result<T, E>)>,
        workers: Vec<JoinHandle<()>>,
    ) {
        match self.policy {
            // Dropping the handles detaches; workers keep claiming until the
            // cursor is exhausted.
            FailurePolicy::Detach => {}
            FailurePolicy::Drain => {
                rx.close();
                resume_worker_panic(workers).await;
                while let Ok((index, outcome)) = rx.try_recv() {
                    debug!(index, ok = outcome.is_ok(), "discarding outcome settled after failure");
                }
            }
            FailurePolicy::Abort => {
                for handle in &workers {
                    handle.abort();
                }
            }
        }
    }
}

/// Take the next unclaimed task. Never suspends.
fn claim<F>(cursor: &Cursor<F>) -> Option<(usize, F)> {
    cursor
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .next()
}

async fn run_worker<T, E, F, Fut>(
    worker: usize,
    mut index: usize,
    mut running: Fut,
    cursor: Cursor<F>,
    tx: Outcomes<T, E>,
    policy: FailurePolicy,
) where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    loop {
        let outcome = running.await;
        debug!(worker, index, ok = outcome.is_ok(), "task settled");

        if tx.send((index, outcome)).is_err() {
            debug!(worker, index, "outcome already settled, result discarded");
        }
        if tx.is_closed() && !policy.claims_after_failure() {
            debug!(worker, ?policy, "outcome settled, worker stops claiming");
            return;
        }

        match claim(&cursor) {
            Some((next, task)) => {
                debug!(worker, index = next, "task claimed");
                index = next;
                running = task();
            }
            None => {
                debug!(worker, "no tasks left, worker exiting");
                return;
            }
        }
    }
}

/// Await every worker, re-raising the first panic on the caller.
async fn resume_worker_panic(workers: Vec<JoinHandle<()>>) {
    for handle in workers {
        if let Err(err) = handle.await {
            if err.is_panic() {
                panic::resume_unwind(err.into_panic());
            }
        }
    }
}
