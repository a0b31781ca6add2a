//! Bounded-concurrency execution of a lazy sequence of operations.
//!
//! A feeder task pulls not-yet-started operations from the source into a
//! bounded channel, and `limit` workers (MPMC over `async-channel`) each take
//! one operation, drive it to completion and push its result to the outcome
//! channel. Results therefore arrive in completion order.
//!
//! An `Err` result is fatal: the scheduler stops handing out operations, lets
//! the ones already in flight finish, and closes the stream once they have
//! reported.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, anyhow};
use async_channel::{Receiver, Sender};
use tracing::{debug, error, trace};

pub struct BoundedScheduler {
    limit: usize,
}

impl BoundedScheduler {
    /// `limit` is the maximum number of operations in flight; 0 is treated as 1.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Start scheduling `source` and return the stream of results.
    ///
    /// Every operation of the source is started at most once, and exactly once
    /// unless a fatal error stops the run. Must be called within a Tokio
    /// runtime.
    pub fn run<I, F, T>(&self, source: I) -> OutcomeStream<T>
    where
        I: IntoIterator<Item = F>,
        I::IntoIter: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (task_sender, task_receiver) = async_channel::bounded::<F>(self.limit);
        let (outcome_sender, outcome_receiver) = async_channel::bounded::<Result<T>>(self.limit);
        let halted = Arc::new(AtomicBool::new(false));

        spawn_feeder(source.into_iter(), task_sender, halted.clone());

        for worker_index in 0..self.limit {
            spawn_worker(
                worker_index,
                task_receiver.clone(),
                outcome_sender.clone(),
                halted.clone(),
            );
        }

        // The stream ends when the last worker drops its sender.
        drop(outcome_sender);

        OutcomeStream {
            receiver: outcome_receiver,
        }
    }
}

/// Results of scheduled operations, in completion order.
pub struct OutcomeStream<T> {
    receiver: Receiver<Result<T>>,
}

impl<T> OutcomeStream<T> {
    /// Next completed result, or `None` once every started operation has
    /// reported.
    pub async fn next(&mut self) -> Option<Result<T>> {
        self.receiver.recv().await.ok()
    }
}

fn spawn_feeder<S, F>(source: S, task_sender: Sender<F>, halted: Arc<AtomicBool>)
where
    S: Iterator<Item = F> + Send + 'static,
    F: Send + 'static,
{
    tokio::spawn(async move {
        for task in source {
            if halted.load(Ordering::SeqCst) {
                break;
            }
            if task_sender.send(task).await.is_err() {
                break;
            }
        }
        trace!("scheduler feeder finished.");
    });
}

fn spawn_worker<F, T>(
    worker_index: usize,
    task_receiver: Receiver<F>,
    outcome_sender: Sender<Result<T>>,
    halted: Arc<AtomicBool>,
) where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let panic_sender = outcome_sender.clone();
    let panic_receiver = task_receiver.clone();
    let panic_halted = halted.clone();

    tokio::spawn(async move {
        let join_result = tokio::spawn(async move {
            worker_loop(task_receiver, outcome_sender, halted).await;
        })
        .await;

        match join_result {
            Ok(()) => {
                trace!(worker_index, "scheduler worker retired.");
            }
            Err(e) => {
                panic_halted.store(true, Ordering::SeqCst);
                panic_receiver.close();
                error!(worker_index, "scheduler worker panicked: {}", e);
                let _ = panic_sender
                    .send(Err(anyhow!("scheduler worker panicked: {}", e)))
                    .await;
            }
        }
    });
}

async fn worker_loop<F, T>(
    task_receiver: Receiver<F>,
    outcome_sender: Sender<Result<T>>,
    halted: Arc<AtomicBool>,
) where
    F: Future<Output = Result<T>>,
{
    while let Ok(task) = task_receiver.recv().await {
        // close() still lets buffered tasks drain, so check the flag per task
        if halted.load(Ordering::SeqCst) {
            break;
        }

        let result = task.await;
        let fatal = result.is_err();
        if fatal {
            halted.store(true, Ordering::SeqCst);
            task_receiver.close();
        }

        if outcome_sender.send(result).await.is_err() {
            debug!("outcome stream dropped, stopping scheduler.");
            halted.store(true, Ordering::SeqCst);
            task_receiver.close();
            break;
        }
        if fatal {
            break;
        }
    }
}
