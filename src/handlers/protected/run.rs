use axum::extract::{Extension, State};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::api::{ApiJson, ApiQuery, IdPath};
use crate::config;
use crate::database::models::{NewRun, Run};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::validation::blank_as_none;

#[derive(Debug, Default, Deserialize)]
pub struct RunListQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub limit: Option<i64>,
}

/// POST /api/requests/:id/runs - log a result produced by an external executor
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(request_id): IdPath,
    ApiJson(input): ApiJson<NewRun>,
) -> ApiResult<Run> {
    let input = input.validated()?;
    let store = state.store();
    store.get_request(user.user_id, request_id).await?;

    let run = store.create_run(user.user_id, request_id, input).await?;

    debug!(
        "User {} logged run {} for request {} (status {:?})",
        user.user_id, run.id, request_id, run.status_code
    );
    Ok(ApiResponse::created(run))
}

/// GET /api/requests/:id/runs[?limit=N] - newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(request_id): IdPath,
    ApiQuery(query): ApiQuery<RunListQuery>,
) -> ApiResult<Vec<Run>> {
    let limit = config::config().run_list_limit(query.limit);
    let store = state.store();
    store.get_request(user.user_id, request_id).await?;

    let runs = store.list_runs(user.user_id, Some(request_id), limit).await?;
    Ok(ApiResponse::success(runs))
}

/// DELETE /api/requests/:id/runs - clear a request's history
pub async fn clear(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(request_id): IdPath,
) -> ApiResult<Value> {
    let store = state.store();
    store.get_request(user.user_id, request_id).await?;

    let deleted = store.clear_runs(user.user_id, request_id).await?;

    info!("User {} cleared {} runs of request {}", user.user_id, deleted, request_id);
    Ok(ApiResponse::success(json!({ "request_id": request_id, "deleted": deleted })))
}

/// GET /api/runs[?limit=N] - recent runs across all of the caller's requests
pub async fn recent(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<RunListQuery>,
) -> ApiResult<Vec<Run>> {
    let limit = config::config().run_list_limit(query.limit);
    let runs = state.store().list_runs(user.user_id, None, limit).await?;
    Ok(ApiResponse::success(runs))
}

/// GET /api/runs/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(id): IdPath,
) -> ApiResult<Run> {
    let run = state.store().get_run(user.user_id, id).await?;
    Ok(ApiResponse::success(run))
}

/// DELETE /api/runs/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(id): IdPath,
) -> ApiResult<Value> {
    state.store().delete_run(user.user_id, id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}
