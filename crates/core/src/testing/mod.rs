//! Testing utilities and mock implementations.
//!
//! This module provides an in-memory [`ItemRepository`](crate::item::ItemRepository)
//! with controllable latency and failure injection, allowing the bulk
//! pipeline to be exercised without a database.
//!
//! # Example
//!
//! ```rust,ignore
//! use itemflow_core::testing::{fixtures, MockItemRepository};
//!
//! let repository = MockItemRepository::with_items(vec![fixtures::new_item("Alpha")]);
//! repository.set_read_delay(Duration::from_millis(20));
//! ```

mod mock_repository;

pub use mock_repository::MockItemRepository;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::item::{Item, ItemInput, ItemStatus};

    /// Input that passes validation.
    pub fn valid_input(name: &str) -> ItemInput {
        ItemInput::new(
            name,
            format!("Description of {}", name),
            format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        )
    }

    /// A valid item in `NEW` status.
    pub fn new_item(name: &str) -> Item {
        Item::new(valid_input(name))
    }

    /// A valid item in the given status.
    pub fn item_with_status(name: &str, status: ItemStatus) -> Item {
        Item::new(valid_input(name).with_status(status))
    }
}
