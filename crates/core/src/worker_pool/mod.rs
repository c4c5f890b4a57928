//! Bounded worker pool for blocking units of work.
//!
//! The pool runs a fixed number of workers that pull tasks from a bounded
//! backlog. Each submission returns a [`TaskHandle`] which resolves once that
//! single task has finished, carrying either the task's own output or a
//! [`PoolError`] if the task panicked.
//!
//! # Example
//!
//! ```ignore
//! use itemflow_core::worker_pool::{WorkerPool, WorkerPoolConfig};
//!
//! let pool = WorkerPool::new(WorkerPoolConfig::default());
//!
//! let handle = pool.submit(|| 2 + 2).await?;
//! assert_eq!(handle.await?, 4);
//!
//! // Drain outstanding work before exiting
//! pool.shutdown().await;
//! ```

mod config;
mod pool;
mod types;

pub use config::WorkerPoolConfig;
pub use pool::{PoolError, WorkerPool};
pub use types::{PoolStatus, TaskHandle};
