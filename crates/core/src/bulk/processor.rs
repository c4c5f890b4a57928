//! Bulk processor implementation.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::item::{validate_item, Item, ItemError, ItemRepository, ItemStatus};
use crate::metrics::{BULK_DURATION, BULK_ITEMS, BULK_RUNS};
use crate::worker_pool::{PoolError, TaskHandle, WorkerPool};

use super::types::{BulkResult, ItemFailure, ProcessingOutcome};

/// Error type for a whole bulk run.
#[derive(Debug, thiserror::Error)]
pub enum BulkError {
    /// The identifier list could not be read.
    #[error("Failed to fetch item ids: {0}")]
    FetchIds(#[source] ItemError),

    /// The pool refused a task.
    #[error("Failed to dispatch item task: {0}")]
    Pool(#[from] PoolError),
}

/// Processes every stored item on a worker pool.
pub struct BulkProcessor {
    pool: Arc<WorkerPool>,
    repository: Arc<dyn ItemRepository>,
}

impl BulkProcessor {
    pub fn new(pool: Arc<WorkerPool>, repository: Arc<dyn ItemRepository>) -> Self {
        Self { pool, repository }
    }

    /// Processes all items currently in storage.
    ///
    /// Resolves only after every submitted task has finished. Per-item
    /// failures are part of the result; the run itself fails only if the
    /// identifiers cannot be read or the pool refuses a task.
    pub async fn process_all(&self) -> Result<BulkResult, BulkError> {
        let started = Instant::now();
        let started_at = Utc::now();

        let result = self.run(started_at).await;

        let elapsed = started.elapsed();
        let label = if result.is_ok() { "completed" } else { "failed" };
        BULK_RUNS.with_label_values(&[label]).inc();
        BULK_DURATION
            .with_label_values(&[label])
            .observe(elapsed.as_secs_f64());

        match &result {
            Ok(bulk) => {
                BULK_ITEMS
                    .with_label_values(&["processed"])
                    .inc_by(bulk.processed().len() as u64);
                for failure in bulk.failures() {
                    BULK_ITEMS
                        .with_label_values(&[failure.reason.as_str()])
                        .inc();
                    warn!("Item {} not processed: {}", failure.id, failure.message);
                }
                info!(
                    "Bulk run finished in {:?}: {} processed, {} failed",
                    elapsed,
                    bulk.processed().len(),
                    bulk.failures().len()
                );
            }
            Err(e) => warn!("Bulk run failed after {:?}: {}", elapsed, e),
        }

        result
    }

    async fn run(&self, started_at: DateTime<Utc>) -> Result<BulkResult, BulkError> {
        let ids = self.fetch_ids().await?;
        info!("Bulk run started for {} items", ids.len());

        let mut handles: Vec<TaskHandle<Result<Item, ItemError>>> = Vec::with_capacity(ids.len());
        for &id in &ids {
            let repository = Arc::clone(&self.repository);
            match self
                .pool
                .submit(move || process_item(repository.as_ref(), id))
                .await
            {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    warn!(
                        "Could not submit item {} ({} of {} submitted): {}",
                        id,
                        handles.len(),
                        ids.len(),
                        e
                    );
                    // Tasks already accepted keep writing; wait for them first.
                    join_all(handles).await;
                    return Err(BulkError::Pool(e));
                }
            }
        }

        let completions = join_all(handles).await;

        let panicked: Vec<Uuid> = ids
            .iter()
            .zip(&completions)
            .filter(|(_, completion)| completion.is_err())
            .map(|(&id, _)| id)
            .collect();
        if !panicked.is_empty() {
            self.mark_panicked(&panicked).await;
        }

        let outcomes = ids
            .into_iter()
            .zip(completions)
            .map(|(id, completion)| match completion {
                Ok(Ok(item)) => ProcessingOutcome::Processed(item),
                Ok(Err(e)) => ProcessingOutcome::Failed(ItemFailure::from_error(id, &e)),
                Err(_) => ProcessingOutcome::Failed(ItemFailure::panicked(id)),
            });

        Ok(BulkResult::from_outcomes(outcomes, started_at))
    }

    /// Best-effort NEW -> ERROR for items whose task unwound.
    async fn mark_panicked(&self, ids: &[Uuid]) {
        let mut handles = Vec::with_capacity(ids.len());
        for &id in ids {
            let repository = Arc::clone(&self.repository);
            match self
                .pool
                .submit(move || mark_error_if_new(repository.as_ref(), id))
                .await
            {
                Ok(handle) => handles.push(handle),
                Err(e) => warn!("Could not schedule ERROR mark for item {}: {}", id, e),
            }
        }

        let unwound = join_all(handles)
            .await
            .into_iter()
            .filter(Result::is_err)
            .count();
        if unwound > 0 {
            warn!("{} ERROR marks for panicked items did not complete", unwound);
        }
    }

    async fn fetch_ids(&self) -> Result<Vec<Uuid>, BulkError> {
        let repository = Arc::clone(&self.repository);

        tokio::task::spawn_blocking(move || repository.find_all_ids())
            .await
            .map_err(|e| {
                BulkError::FetchIds(ItemError::Persistence(format!(
                    "identifier fetch aborted: {}",
                    e
                )))
            })?
            .map_err(BulkError::FetchIds)
    }
}

/// Runs on a worker: re-read, mark processed, validate, persist.
fn process_item(repository: &dyn ItemRepository, id: Uuid) -> Result<Item, ItemError> {
    let item = repository.find_by_id(id)?.ok_or(ItemError::NotFound(id))?;

    if !item.status.can_process() {
        return Err(ItemError::InvalidState {
            id,
            status: item.status,
        });
    }

    let mut updated = item.clone();
    updated.status = ItemStatus::Processed;

    let result = validate_item(&updated)
        .map_err(ItemError::from)
        .and_then(|()| repository.save(updated));

    match &result {
        Ok(_) => debug!("Item {} processed", id),
        Err(e) if item.status == ItemStatus::New => mark_error(repository, item, e),
        Err(_) => {}
    }

    result
}

/// Re-reads an item and marks it ERROR if it is still NEW.
fn mark_error_if_new(repository: &dyn ItemRepository, id: Uuid) {
    match repository.find_by_id(id) {
        Ok(Some(item)) if item.status == ItemStatus::New => {
            mark_error(repository, item, &"processing task panicked")
        }
        Ok(_) => {}
        Err(e) => warn!("Could not re-read item {} after a panic: {}", id, e),
    }
}

/// Best-effort NEW -> ERROR after a failed attempt.
fn mark_error(repository: &dyn ItemRepository, mut item: Item, cause: &dyn fmt::Display) {
    let id = item.id;
    item.status = ItemStatus::Error;

    if let Err(e) = repository.save(item) {
        warn!(
            "Could not mark item {} as ERROR after '{}': {}",
            id, cause, e
        );
    }
}
