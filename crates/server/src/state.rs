use std::sync::Arc;

use itemflow_core::{BulkProcessor, ItemRepository, WorkerPool};

/// Shared application state
pub struct AppState {
    repository: Arc<dyn ItemRepository>,
    pool: Arc<WorkerPool>,
    processor: BulkProcessor,
}

impl AppState {
    pub fn new(repository: Arc<dyn ItemRepository>, pool: Arc<WorkerPool>) -> Self {
        let processor = BulkProcessor::new(Arc::clone(&pool), Arc::clone(&repository));

        Self {
            repository,
            pool,
            processor,
        }
    }

    /// Owned handle, for moving into blocking tasks.
    pub fn repository(&self) -> Arc<dyn ItemRepository> {
        Arc::clone(&self.repository)
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn processor(&self) -> &BulkProcessor {
        &self.processor
    }
}
