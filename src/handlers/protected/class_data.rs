use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, QueryRejection},
        Query, State,
    },
};

use crate::database::ClassStore;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::requests::{ActionEnvelope, DeleteQuery};
use crate::models::{
    CreateAction, CreatedResponse, DeleteAction, Snapshot, SuccessResponse, UpdateAction,
};

/// State shared by the data handlers
#[derive(Clone)]
pub struct DataState {
    pub store: Arc<dyn ClassStore>,
}

/// GET - Class photo plus every collection in one response
pub async fn snapshot_get(State(state): State<DataState>) -> ApiResult<Snapshot> {
    let mut session = state.store.open().await?;
    let snapshot = session.snapshot().await?;
    Ok(ApiResponse::success(snapshot))
}

/// POST `{action: add_*, data}` - Insert one row, answer `{id}`
pub async fn create_post(
    State(state): State<DataState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<CreatedResponse> {
    let envelope = ActionEnvelope::from_slice(&body?)?;
    let action = CreateAction::parse(envelope.action.as_deref(), envelope.data)?;

    let mut session = state.store.open().await?;
    let id = session.create(&action).await?;

    tracing::info!(action = action.name(), id, "Record created");
    Ok(ApiResponse::success(CreatedResponse { id }))
}

/// PUT `{action: update_*, data}` - Update one row (or upsert the class photo)
///
/// A missing id is not an error: zero rows change and the answer is still
/// `{success: true}`.
pub async fn update_put(
    State(state): State<DataState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<SuccessResponse> {
    let envelope = ActionEnvelope::from_slice(&body?)?;
    let action = UpdateAction::parse(envelope.action.as_deref(), envelope.data)?;

    let mut session = state.store.open().await?;
    let rows = session.update(&action).await?;

    tracing::info!(action = action.name(), rows, "Record updated");
    Ok(ApiResponse::success(SuccessResponse::ok()))
}

/// DELETE `?action=delete_*&id=N` - Remove one row; deleting twice is harmless
pub async fn delete(
    State(state): State<DataState>,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> ApiResult<SuccessResponse> {
    let Query(query) = query?;
    let action = DeleteAction::parse(query)?;

    let mut session = state.store.open().await?;
    let rows = session.delete(action).await?;

    tracing::info!(collection = %action.collection, id = action.id, rows, "Record deleted");
    Ok(ApiResponse::success(SuccessResponse::ok()))
}

/// Any method without a matching operation
pub async fn bad_request() -> ApiError {
    ApiError::bad_request("Bad request")
}
