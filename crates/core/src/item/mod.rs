//! Items: the persisted records moved through the processing pipeline.

mod sqlite_store;
mod store;
mod types;
mod validate;

pub use sqlite_store::SqliteItemRepository;
pub use store::{ItemError, ItemRepository};
pub use types::{Item, ItemInput, ItemStatus, ParseStatusError};
pub use validate::{validate_item, validate_item_input, FieldError, ValidationErrors};
