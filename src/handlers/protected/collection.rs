use axum::extract::{Extension, State};
use serde_json::{json, Value};
use tracing::info;

use crate::api::{ApiJson, IdPath};
use crate::database::models::{Collection, CollectionPatch, CollectionSummary, NewCollection, RequestScope, SavedRequest};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /api/collections - caller's collections with request counts
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<CollectionSummary>> {
    let collections = state.store().list_collections(user.user_id).await?;
    Ok(ApiResponse::success(collections))
}

/// GET /api/collections/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(id): IdPath,
) -> ApiResult<Collection> {
    let collection = state.store().get_collection(user.user_id, id).await?;
    Ok(ApiResponse::success(collection))
}

/// POST /api/collections
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(input): ApiJson<NewCollection>,
) -> ApiResult<Collection> {
    let input = input.validated()?;
    let collection = state.store().create_collection(user.user_id, input).await?;

    info!("User {} created collection {}", user.user_id, collection.id);
    Ok(ApiResponse::created(collection))
}

/// PATCH /api/collections/:id - merge the fields present in the body
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(id): IdPath,
    ApiJson(patch): ApiJson<CollectionPatch>,
) -> ApiResult<Collection> {
    let patch = patch.validated()?;
    let collection = state.store().update_collection(user.user_id, id, patch).await?;
    Ok(ApiResponse::success(collection))
}

/// DELETE /api/collections/:id - requests inside become ungrouped
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(id): IdPath,
) -> ApiResult<Value> {
    state.store().delete_collection(user.user_id, id).await?;

    info!("User {} deleted collection {}", user.user_id, id);
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}

/// GET /api/collections/:id/requests
pub async fn requests(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(id): IdPath,
) -> ApiResult<Vec<SavedRequest>> {
    let store = state.store();
    store.get_collection(user.user_id, id).await?;
    let requests = store.list_requests(user.user_id, RequestScope::Collection(id)).await?;
    Ok(ApiResponse::success(requests))
}
