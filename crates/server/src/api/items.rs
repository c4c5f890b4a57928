//! Item API handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use itemflow_core::{
    validate_item_input, BulkError, Item, ItemError, ItemInput, ItemRepository, PoolError,
    ValidationErrors,
};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Field-level problems, present for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ValidationErrors>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            details: None,
        }),
    )
}

impl From<ItemError> for ErrorResponse {
    fn from(e: ItemError) -> Self {
        let error = e.to_string();
        let details = match e {
            ItemError::Validation(errors) => Some(errors),
            _ => None,
        };
        Self { error, details }
    }
}

fn item_error(e: ItemError) -> ApiError {
    let status = match &e {
        ItemError::NotFound(_) => StatusCode::NOT_FOUND,
        ItemError::Validation(_) => StatusCode::BAD_REQUEST,
        ItemError::InvalidState { .. } => StatusCode::CONFLICT,
        ItemError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::from(e)))
}

fn bulk_error(e: BulkError) -> ApiError {
    let status = match &e {
        BulkError::Pool(PoolError::Saturated { .. } | PoolError::ShutDown) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e.to_string())
}

/// Unreadable bodies are client errors, whatever the cause.
fn json_body(payload: Result<Json<ItemInput>, JsonRejection>) -> Result<ItemInput, ApiError> {
    payload.map(|Json(input)| input).map_err(|e| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Invalid request body: {}", e.body_text()),
        )
    })
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id)
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, format!("Invalid item id: {}", id)))
}

/// Runs a repository call on the blocking pool.
async fn with_repository<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&dyn ItemRepository) -> Result<T, ItemError> + Send + 'static,
    T: Send + 'static,
{
    let repository = state.repository();

    tokio::task::spawn_blocking(move || f(repository.as_ref()))
        .await
        .map_err(|e| {
            error!("Repository task failed: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Repository task failed")
        })?
        .map_err(item_error)
}

// ============================================================================
// Handlers
// ============================================================================

/// List all items
pub async fn list_items(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Item>>, ApiError> {
    let items = with_repository(&state, |repository| repository.find_all()).await?;
    Ok(Json(items))
}

/// Create a new item
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ItemInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let input = json_body(payload)?;
    validate_item_input(&input).map_err(|e| item_error(e.into()))?;

    let item = Item::new(input);
    let saved = with_repository(&state, move |repository| repository.save(item)).await?;

    info!("Created item {}", saved.id);
    Ok((StatusCode::CREATED, Json(saved)))
}

/// Get an item by ID
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    let id = parse_id(&id)?;

    let item = with_repository(&state, move |repository| {
        repository.find_by_id(id)?.ok_or(ItemError::NotFound(id))
    })
    .await?;

    Ok(Json(item))
}

/// Replace an existing item
///
/// A missing status keeps the stored one.
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ItemInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let id = parse_id(&id)?;
    let input = json_body(payload)?;
    validate_item_input(&input).map_err(|e| item_error(e.into()))?;

    let saved = with_repository(&state, move |repository| {
        let existing = repository.find_by_id(id)?.ok_or(ItemError::NotFound(id))?;
        let status = input.status.unwrap_or(existing.status);
        repository.save(Item::with_id(id, input.with_status(status)))
    })
    .await?;

    info!("Updated item {}", id);
    Ok((StatusCode::CREATED, Json(saved)))
}

/// Delete an item
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;

    with_repository(&state, move |repository| repository.delete_by_id(id)).await?;

    info!("Deleted item {}", id);
    Ok(StatusCode::OK)
}

/// Process every stored item and return those that succeeded
pub async fn process_items(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let result = state.processor().process_all().await.map_err(bulk_error)?;
    Ok(Json(result.into_processed()))
}
