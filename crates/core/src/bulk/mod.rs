//! Bulk processing of every stored item.
//!
//! [`BulkProcessor::process_all`] reads all item identifiers, submits one
//! task per item to the [`WorkerPool`](crate::worker_pool::WorkerPool), waits
//! for every task handle, and only then builds a [`BulkResult`]. Each task
//! reports its own outcome through its handle; no collection is shared
//! between tasks.
//!
//! Per-item problems (item deleted in the meantime, failed validation,
//! storage errors, panics) become [`ItemFailure`] entries. Only a failed
//! identifier fetch or a refused submission fails the whole run.
//!
//! Dropping the `process_all` future stops further submissions. Tasks the
//! pool already accepted still run to completion.
//!
//! # Example
//!
//! ```ignore
//! let processor = BulkProcessor::new(Arc::clone(&pool), repository);
//! let result = processor.process_all().await?;
//! println!("{} processed, {} failed", result.processed().len(), result.failures().len());
//! ```

mod processor;
mod types;

pub use processor::{BulkError, BulkProcessor};
pub use types::{BulkResult, FailureReason, ItemFailure, ProcessingOutcome};
