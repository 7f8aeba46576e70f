use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::models::{
    Collection, CollectionPatch, CollectionSummary, NewCollection, NewRequest, NewRun, RequestPatch,
    RequestScope, Run, SavedRequest,
};

/// Errors from a Store implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{resource} '{id}' not found")]
    NotFound { resource: &'static str, id: Uuid },

    #[error("referenced {0} no longer exists")]
    MissingParent(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(resource: &'static str, id: Uuid) -> Self {
        StoreError::NotFound { resource, id }
    }
}

/// Ownership-scoped persistence for collections, saved requests and runs.
///
/// Every method takes the calling user's id and only ever sees that user's
/// rows: another user's row is reported exactly like a missing one.
/// Parent ownership (collection of a request, request of a run) is checked
/// by the caller before writes.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    // Collections
    async fn list_collections(&self, user_id: Uuid) -> Result<Vec<CollectionSummary>, StoreError>;
    async fn get_collection(&self, user_id: Uuid, id: Uuid) -> Result<Collection, StoreError>;
    async fn create_collection(&self, user_id: Uuid, input: NewCollection) -> Result<Collection, StoreError>;
    async fn update_collection(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: CollectionPatch,
    ) -> Result<Collection, StoreError>;
    /// Requests in the collection are kept and become ungrouped
    async fn delete_collection(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError>;

    // Requests
    async fn list_requests(&self, user_id: Uuid, scope: RequestScope) -> Result<Vec<SavedRequest>, StoreError>;
    async fn get_request(&self, user_id: Uuid, id: Uuid) -> Result<SavedRequest, StoreError>;
    async fn create_request(&self, user_id: Uuid, input: NewRequest) -> Result<SavedRequest, StoreError>;
    async fn update_request(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: RequestPatch,
    ) -> Result<SavedRequest, StoreError>;
    /// Runs of the request are deleted with it
    async fn delete_request(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError>;

    // Runs
    async fn create_run(&self, user_id: Uuid, request_id: Uuid, input: NewRun) -> Result<Run, StoreError>;
    /// Newest `started_at` first, optionally restricted to one request
    async fn list_runs(
        &self,
        user_id: Uuid,
        request_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<Run>, StoreError>;
    async fn get_run(&self, user_id: Uuid, id: Uuid) -> Result<Run, StoreError>;
    async fn delete_run(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError>;
    /// Returns the number of runs removed
    async fn clear_runs(&self, user_id: Uuid, request_id: Uuid) -> Result<u64, StoreError>;
}
