//! Types for the bulk module.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::item::{Item, ItemError};

/// Why a single item could not be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The item was deleted after its identifier was listed.
    NotFound,
    /// The stored item breaks a validation rule.
    Validation,
    /// The item's status does not allow processing.
    InvalidState,
    /// Reading or writing the item failed.
    Persistence,
    /// The task panicked.
    Panicked,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::NotFound => "not_found",
            FailureReason::Validation => "validation",
            FailureReason::InvalidState => "invalid_state",
            FailureReason::Persistence => "persistence",
            FailureReason::Panicked => "panicked",
        }
    }
}

impl From<&ItemError> for FailureReason {
    fn from(error: &ItemError) -> Self {
        match error {
            ItemError::NotFound(_) => FailureReason::NotFound,
            ItemError::Validation(_) => FailureReason::Validation,
            ItemError::InvalidState { .. } => FailureReason::InvalidState,
            ItemError::Persistence(_) => FailureReason::Persistence,
        }
    }
}

/// A failed item, tagged with its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub id: Uuid,
    pub reason: FailureReason,
    pub message: String,
}

impl ItemFailure {
    pub fn from_error(id: Uuid, error: &ItemError) -> Self {
        Self {
            id,
            reason: FailureReason::from(error),
            message: error.to_string(),
        }
    }

    pub fn panicked(id: Uuid) -> Self {
        Self {
            id,
            reason: FailureReason::Panicked,
            message: "Processing task panicked".to_string(),
        }
    }
}

/// Outcome of one item task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    Processed(Item),
    Failed(ItemFailure),
}

/// Aggregate result of one bulk run.
///
/// Built once from the outcomes of every task; read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct BulkResult {
    processed: Vec<Item>,
    failures: Vec<ItemFailure>,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl BulkResult {
    /// Splits outcomes into successes and failures, keeping their order.
    pub fn from_outcomes(
        outcomes: impl IntoIterator<Item = ProcessingOutcome>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let mut processed = Vec::new();
        let mut failures = Vec::new();

        for outcome in outcomes {
            match outcome {
                ProcessingOutcome::Processed(item) => processed.push(item),
                ProcessingOutcome::Failed(failure) => failures.push(failure),
            }
        }

        Self {
            processed,
            failures,
            started_at,
            completed_at: Utc::now(),
        }
    }

    /// Successfully processed items, in identifier order.
    pub fn processed(&self) -> &[Item] {
        &self.processed
    }

    /// Failed items, in identifier order.
    pub fn failures(&self) -> &[ItemFailure] {
        &self.failures
    }

    /// Number of items the run handled.
    pub fn total(&self) -> usize {
        self.processed.len() + self.failures.len()
    }

    pub fn is_full_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    pub fn into_processed(self) -> Vec<Item> {
        self.processed
    }
}
