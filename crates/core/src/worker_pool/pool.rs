//! Worker pool implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc::error::{SendTimeoutError, TrySendError};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::WorkerPoolConfig;
use super::types::{PoolStatus, TaskHandle};
use crate::metrics::POOL_SUBMISSIONS_REJECTED;

/// Error type for worker pool operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The backlog stayed full for the whole submission timeout.
    #[error("Worker pool saturated: no queue slot freed within {timeout_ms}ms")]
    Saturated { timeout_ms: u64 },

    /// The pool no longer accepts submissions.
    #[error("Worker pool is shut down")]
    ShutDown,

    /// The task panicked before producing a value.
    #[error("Task panicked")]
    TaskPanicked,
}

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Tracks counters for the pool.
#[derive(Default)]
struct PoolStats {
    active: AtomicU64,
    queued: AtomicU64,
    total_completed: AtomicU64,
    total_panicked: AtomicU64,
    total_rejected: AtomicU64,
}

/// Fixed-size pool of workers with a bounded backlog.
///
/// Tasks are blocking closures; each worker hands its current task to the
/// runtime's blocking threads and waits for it, so at most `workers` tasks
/// run at once. Must be created from within a Tokio runtime.
pub struct WorkerPool {
    name: String,
    config: WorkerPoolConfig,
    sender: RwLock<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    stats: Arc<PoolStats>,
}

impl WorkerPool {
    /// Creates a pool named "items" and starts its workers.
    pub fn new(config: WorkerPoolConfig) -> Self {
        Self::with_name("items", config)
    }

    /// Creates a named pool and starts its workers.
    pub fn with_name(name: impl Into<String>, config: WorkerPoolConfig) -> Self {
        let name = name.into();
        let worker_count = config.workers.max(1);
        let (tx, rx) = mpsc::channel::<Job>(config.queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let stats = Arc::new(PoolStats::default());

        let workers = (0..worker_count)
            .map(|index| {
                tokio::spawn(Self::run_worker(
                    name.clone(),
                    index,
                    Arc::clone(&rx),
                    Arc::clone(&stats),
                ))
            })
            .collect();

        info!(
            "Worker pool '{}' started ({} workers, queue capacity {})",
            name, worker_count, config.queue_capacity
        );

        Self {
            name,
            config,
            sender: RwLock::new(Some(tx)),
            workers: Mutex::new(workers),
            stats,
        }
    }

    /// Submits a task, waiting up to the configured timeout for a queue slot.
    ///
    /// With a zero timeout this fails immediately when the queue is full.
    /// An accepted task always runs, even if the pool is shut down afterwards.
    pub async fn submit<F, T>(&self, task: F) -> Result<TaskHandle<T>, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.current_sender().ok_or(PoolError::ShutDown)?;
        let timeout = self.config.submit_timeout();
        let (job, handle) = package(task);

        self.stats.queued.fetch_add(1, Ordering::Relaxed);

        let result = if timeout.is_zero() {
            sender.try_send(job).map_err(|e| match e {
                TrySendError::Full(_) => self.saturated(),
                TrySendError::Closed(_) => PoolError::ShutDown,
            })
        } else {
            sender.send_timeout(job, timeout).await.map_err(|e| match e {
                SendTimeoutError::Timeout(_) => self.saturated(),
                SendTimeoutError::Closed(_) => PoolError::ShutDown,
            })
        };

        self.settle_submission(result).map(|()| handle)
    }

    /// Submits a task without waiting; fails with `Saturated` if the queue is full.
    pub fn try_submit<F, T>(&self, task: F) -> Result<TaskHandle<T>, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.current_sender().ok_or(PoolError::ShutDown)?;
        let (job, handle) = package(task);

        self.stats.queued.fetch_add(1, Ordering::Relaxed);

        let result = sender.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => self.saturated(),
            TrySendError::Closed(_) => PoolError::ShutDown,
        });

        self.settle_submission(result).map(|()| handle)
    }

    /// Stops accepting tasks and waits until every accepted task has run.
    ///
    /// Calling it again is a no-op.
    pub async fn shutdown(&self) {
        let sender = self
            .sender
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        if sender.is_none() {
            return;
        }

        // Workers exit once the channel is closed and drained.
        drop(sender);
        info!("Shutting down worker pool '{}'", self.name);

        let workers = std::mem::take(&mut *self.workers.lock().await);
        for worker in workers {
            if let Err(e) = worker.await {
                warn!("Worker of pool '{}' ended abnormally: {}", self.name, e);
            }
        }

        info!("Worker pool '{}' stopped", self.name);
    }

    /// Returns the current pool status.
    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            name: self.name.clone(),
            workers: self.config.workers.max(1),
            queue_capacity: self.config.queue_capacity.max(1),
            active_tasks: self.stats.active.load(Ordering::Relaxed) as usize,
            queued_tasks: self.stats.queued.load(Ordering::Relaxed) as usize,
            total_completed: self.stats.total_completed.load(Ordering::Relaxed),
            total_panicked: self.stats.total_panicked.load(Ordering::Relaxed),
            total_rejected: self.stats.total_rejected.load(Ordering::Relaxed),
            accepting: self.current_sender().is_some(),
        }
    }

    fn current_sender(&self) -> Option<mpsc::Sender<Job>> {
        self.sender
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn saturated(&self) -> PoolError {
        PoolError::Saturated {
            timeout_ms: self.config.submit_timeout_ms,
        }
    }

    fn settle_submission(&self, result: Result<(), PoolError>) -> Result<(), PoolError> {
        if let Err(ref e) = result {
            self.stats.queued.fetch_sub(1, Ordering::Relaxed);
            if matches!(e, PoolError::Saturated { .. }) {
                self.stats.total_rejected.fetch_add(1, Ordering::Relaxed);
                POOL_SUBMISSIONS_REJECTED
                    .with_label_values(&[&self.name])
                    .inc();
                warn!("Worker pool '{}' rejected a task: {}", self.name, e);
            }
        }
        result
    }

    async fn run_worker(
        name: String,
        index: usize,
        rx: Arc<Mutex<mpsc::Receiver<Job>>>,
        stats: Arc<PoolStats>,
    ) {
        debug!("Worker {} of pool '{}' started", index, name);

        loop {
            let job = {
                let mut rx = rx.lock().await;
                rx.recv().await
            };
            let Some(job) = job else {
                break;
            };

            stats.queued.fetch_sub(1, Ordering::Relaxed);
            stats.active.fetch_add(1, Ordering::Relaxed);

            let outcome = tokio::task::spawn_blocking(job).await;

            stats.active.fetch_sub(1, Ordering::Relaxed);

            match outcome {
                Ok(()) => {
                    stats.total_completed.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) if e.is_panic() => {
                    stats.total_panicked.fetch_add(1, Ordering::Relaxed);
                    warn!("Task on worker {} of pool '{}' panicked", index, name);
                }
                Err(e) => {
                    warn!("Task on worker {} of pool '{}' was aborted: {}", index, name, e);
                }
            }
        }

        debug!("Worker {} of pool '{}' stopped", index, name);
    }
}

/// Wraps a task so its output is delivered through a oneshot channel.
fn package<F, T>(task: F) -> (Job, TaskHandle<T>)
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let job: Job = Box::new(move || {
        // The handle may have been dropped; the work still counts as done.
        let _ = tx.send(task());
    });
    (job, TaskHandle::new(rx))
}
