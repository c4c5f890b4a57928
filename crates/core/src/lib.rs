pub mod bulk;
pub mod config;
pub mod item;
pub mod metrics;
pub mod testing;
pub mod worker_pool;

pub use bulk::{BulkError, BulkProcessor, BulkResult, FailureReason, ItemFailure, ProcessingOutcome};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    ServerConfig,
};
pub use item::{
    validate_item, validate_item_input, FieldError, Item, ItemError, ItemInput, ItemRepository,
    ItemStatus, ParseStatusError, SqliteItemRepository, ValidationErrors,
};
pub use worker_pool::{PoolError, PoolStatus, TaskHandle, WorkerPool, WorkerPoolConfig};
