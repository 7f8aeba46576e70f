use axum::extract::{Extension, State};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::api::{ApiJson, ApiQuery, IdPath};
use crate::database::models::{NewRequest, RequestPatch, RequestScope, SavedRequest};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RequestListQuery {
    /// Only requests grouped in this collection
    pub collection_id: Option<Uuid>,
    /// Only requests outside any collection
    #[serde(default)]
    pub ungrouped: bool,
}

impl RequestListQuery {
    fn scope(&self) -> Result<RequestScope, ApiError> {
        match (self.collection_id, self.ungrouped) {
            (Some(_), true) => Err(ApiError::bad_request(
                "collection_id and ungrouped cannot be combined",
            )),
            (Some(id), false) => Ok(RequestScope::Collection(id)),
            (None, true) => Ok(RequestScope::Ungrouped),
            (None, false) => Ok(RequestScope::All),
        }
    }
}

/// GET /api/requests[?collection_id=..|?ungrouped=true]
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<RequestListQuery>,
) -> ApiResult<Vec<SavedRequest>> {
    let scope = query.scope()?;
    let store = state.store();
    if let RequestScope::Collection(collection_id) = scope {
        store.get_collection(user.user_id, collection_id).await?;
    }

    let requests = store.list_requests(user.user_id, scope).await?;
    Ok(ApiResponse::success(requests))
}

/// GET /api/requests/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(id): IdPath,
) -> ApiResult<SavedRequest> {
    let request = state.store().get_request(user.user_id, id).await?;
    Ok(ApiResponse::success(request))
}

/// POST /api/requests - the target collection must belong to the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(input): ApiJson<NewRequest>,
) -> ApiResult<SavedRequest> {
    let input = input.validated()?;
    let store = state.store();
    if let Some(collection_id) = input.collection_id {
        store.get_collection(user.user_id, collection_id).await?;
    }

    let request = store.create_request(user.user_id, input).await?;

    info!("User {} saved request {}", user.user_id, request.id);
    Ok(ApiResponse::created(request))
}

/// PATCH /api/requests/:id - conditional field merge; may move between collections
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(id): IdPath,
    ApiJson(patch): ApiJson<RequestPatch>,
) -> ApiResult<SavedRequest> {
    let patch = patch.validated()?;
    let store = state.store();
    if let Some(collection_id) = patch.target_collection() {
        store.get_collection(user.user_id, collection_id).await?;
    }

    let request = store.update_request(user.user_id, id, patch).await?;
    Ok(ApiResponse::success(request))
}

/// DELETE /api/requests/:id - run history goes with it
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(id): IdPath,
) -> ApiResult<Value> {
    state.store().delete_request(user.user_id, id).await?;

    info!("User {} deleted request {}", user.user_id, id);
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}

/// POST /api/requests/:id/duplicate
pub async fn duplicate(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(id): IdPath,
) -> ApiResult<SavedRequest> {
    let store = state.store();
    let source = store.get_request(user.user_id, id).await?;
    let copy = store.create_request(user.user_id, NewRequest::copy_of(&source)).await?;

    info!("User {} duplicated request {} as {}", user.user_id, id, copy.id);
    Ok(ApiResponse::created(copy))
}
