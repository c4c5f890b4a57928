//! Item repository trait and error type.

use uuid::Uuid;

use super::{Item, ItemStatus, ValidationErrors};

/// Error type for item operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemError {
    /// No item with this identifier.
    #[error("Item not found: {0}")]
    NotFound(Uuid),

    /// Item fields break a validation rule.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// The item's status does not allow the operation.
    #[error("Item {id} cannot be processed in status {status}")]
    InvalidState { id: Uuid, status: ItemStatus },

    /// Storage failure.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Synchronous item storage.
///
/// Implementations must be safe to call from many threads at once; the bulk
/// processor calls them from worker threads.
pub trait ItemRepository: Send + Sync {
    /// All items, in insertion order.
    fn find_all(&self) -> Result<Vec<Item>, ItemError>;

    /// All identifiers, in insertion order.
    fn find_all_ids(&self) -> Result<Vec<Uuid>, ItemError>;

    /// Get an item by ID.
    fn find_by_id(&self, id: Uuid) -> Result<Option<Item>, ItemError>;

    /// Insert or replace an item, returning what was stored.
    fn save(&self, item: Item) -> Result<Item, ItemError>;

    /// Delete an item. Fails with `NotFound` if it does not exist.
    fn delete_by_id(&self, id: Uuid) -> Result<(), ItemError>;
}
