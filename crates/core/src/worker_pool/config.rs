//! Configuration for the worker pool.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
    /// Number of tasks allowed to run at the same time.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Number of accepted tasks allowed to wait for a free worker.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// How long `submit` waits for a backlog slot before giving up.
    /// Zero means fail fast.
    #[serde(default = "default_submit_timeout")]
    pub submit_timeout_ms: u64,
}

fn default_workers() -> usize {
    10
}

fn default_queue_capacity() -> usize {
    100
}

fn default_submit_timeout() -> u64 {
    30_000 // 30 seconds
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            submit_timeout_ms: default_submit_timeout(),
        }
    }
}

impl WorkerPoolConfig {
    /// Sets the number of workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the backlog capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Sets the submission timeout.
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Makes `submit` fail immediately when the backlog is full.
    pub fn fail_fast(mut self) -> Self {
        self.submit_timeout_ms = 0;
        self
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }
}
