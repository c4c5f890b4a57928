//! Item record and status types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Pipeline stage of an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    /// Created, not yet processed.
    #[default]
    New,
    /// Successfully processed by a bulk run.
    Processed,
    /// Retired; bulk processing leaves it alone.
    Terminated,
    /// A bulk run failed on this item.
    Error,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 4] = [
        ItemStatus::New,
        ItemStatus::Processed,
        ItemStatus::Terminated,
        ItemStatus::Error,
    ];

    /// Stored/serialized name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::New => "NEW",
            ItemStatus::Processed => "PROCESSED",
            ItemStatus::Terminated => "TERMINATED",
            ItemStatus::Error => "ERROR",
        }
    }

    /// Whether a bulk run may move this item to `Processed`.
    pub fn can_process(&self) -> bool {
        !matches!(self, ItemStatus::Terminated)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown item status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for ItemStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(ItemStatus::New),
            "PROCESSED" => Ok(ItemStatus::Processed),
            "TERMINATED" => Ok(ItemStatus::Terminated),
            "ERROR" => Ok(ItemStatus::Error),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// A persisted item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub email: String,
    pub status: ItemStatus,
}

impl Item {
    /// Builds a new item with a fresh identifier from client input.
    pub fn new(input: ItemInput) -> Self {
        Self::with_id(Uuid::new_v4(), input)
    }

    /// Builds an item with a known identifier from client input.
    ///
    /// A missing status in the input means `New`.
    pub fn with_id(id: Uuid, input: ItemInput) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            email: input.email,
            status: input.status.unwrap_or_default(),
        }
    }
}

/// Client-supplied item fields for create and update.
///
/// Missing fields deserialize as empty strings so they surface as
/// validation errors rather than parse failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemInput {
    pub name: String,
    pub description: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
}

impl ItemInput {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            email: email.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = Some(status);
        self
    }
}
