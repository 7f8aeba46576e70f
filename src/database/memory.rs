use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    Collection, CollectionPatch, CollectionSummary, NewCollection, NewRequest, NewRun, RequestPatch,
    RequestScope, Run, SavedRequest,
};
use super::store::{Store, StoreError};

#[derive(Default)]
struct Tables {
    collections: HashMap<Uuid, Collection>,
    requests: HashMap<Uuid, SavedRequest>,
    runs: HashMap<Uuid, Run>,
}

/// In-process store with the same semantics as the Postgres tables
/// (SET NULL on collection delete, CASCADE on request delete).
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T, K: Ord>(rows: &mut [T], key: impl Fn(&T) -> K) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list_collections(&self, user_id: Uuid) -> Result<Vec<CollectionSummary>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<CollectionSummary> = tables
            .collections
            .values()
            .filter(|c| c.user_id == user_id)
            .map(|c| CollectionSummary {
                collection: c.clone(),
                request_count: tables
                    .requests
                    .values()
                    .filter(|r| r.collection_id == Some(c.id))
                    .count() as i64,
            })
            .collect();
        newest_first(&mut rows, |s| s.collection.updated_at);
        Ok(rows)
    }

    async fn get_collection(&self, user_id: Uuid, id: Uuid) -> Result<Collection, StoreError> {
        let tables = self.tables.read().await;
        tables
            .collections
            .get(&id)
            .filter(|c| c.user_id == user_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("collection", id))
    }

    async fn create_collection(&self, user_id: Uuid, input: NewCollection) -> Result<Collection, StoreError> {
        let now = Utc::now();
        let collection = Collection {
            id: Uuid::new_v4(),
            user_id,
            name: input.name,
            description: input.description,
            icon: input.icon,
            created_at: now,
            updated_at: now,
        };
        let mut tables = self.tables.write().await;
        tables.collections.insert(collection.id, collection.clone());
        Ok(collection)
    }

    async fn update_collection(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: CollectionPatch,
    ) -> Result<Collection, StoreError> {
        let mut tables = self.tables.write().await;
        let collection = tables
            .collections
            .get_mut(&id)
            .filter(|c| c.user_id == user_id)
            .ok_or_else(|| StoreError::not_found("collection", id))?;
        patch.apply(collection);
        collection.updated_at = Utc::now();
        Ok(collection.clone())
    }

    async fn delete_collection(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        match tables.collections.get(&id) {
            Some(c) if c.user_id == user_id => {}
            _ => return Err(StoreError::not_found("collection", id)),
        }
        tables.collections.remove(&id);
        for request in tables.requests.values_mut() {
            if request.collection_id == Some(id) {
                request.collection_id = None;
            }
        }
        Ok(())
    }

    async fn list_requests(&self, user_id: Uuid, scope: RequestScope) -> Result<Vec<SavedRequest>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<SavedRequest> = tables
            .requests
            .values()
            .filter(|r| r.user_id == user_id && scope.matches(r))
            .cloned()
            .collect();
        newest_first(&mut rows, |r| r.updated_at);
        Ok(rows)
    }

    async fn get_request(&self, user_id: Uuid, id: Uuid) -> Result<SavedRequest, StoreError> {
        let tables = self.tables.read().await;
        tables
            .requests
            .get(&id)
            .filter(|r| r.user_id == user_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("request", id))
    }

    async fn create_request(&self, user_id: Uuid, input: NewRequest) -> Result<SavedRequest, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(collection_id) = input.collection_id {
            if !tables.collections.contains_key(&collection_id) {
                return Err(StoreError::MissingParent("collection"));
            }
        }

        let now = Utc::now();
        let request = SavedRequest {
            id: Uuid::new_v4(),
            collection_id: input.collection_id,
            user_id,
            method: input.method_or_default().to_string(),
            name: input.name,
            url: input.url,
            query_params: input.query_params,
            headers: input.headers,
            body_mode: input.body_mode,
            body_content: input.body_content,
            auth_mode: input.auth_mode,
            auth_config: input.auth_config,
            created_at: now,
            updated_at: now,
        };
        tables.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn update_request(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: RequestPatch,
    ) -> Result<SavedRequest, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(collection_id) = patch.target_collection() {
            if !tables.collections.contains_key(&collection_id) {
                return Err(StoreError::MissingParent("collection"));
            }
        }

        let request = tables
            .requests
            .get_mut(&id)
            .filter(|r| r.user_id == user_id)
            .ok_or_else(|| StoreError::not_found("request", id))?;
        patch.apply(request);
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn delete_request(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        match tables.requests.get(&id) {
            Some(r) if r.user_id == user_id => {}
            _ => return Err(StoreError::not_found("request", id)),
        }
        tables.requests.remove(&id);
        tables.runs.retain(|_, run| run.request_id != id);
        Ok(())
    }

    async fn create_run(&self, user_id: Uuid, request_id: Uuid, input: NewRun) -> Result<Run, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.requests.contains_key(&request_id) {
            return Err(StoreError::MissingParent("request"));
        }

        let run = Run {
            id: Uuid::new_v4(),
            request_id,
            user_id,
            started_at: input.started_at,
            completed_at: input.completed_at,
            status_code: input.status_code,
            status_text: input.status_text,
            duration_ms: input.duration_ms,
            response_headers: input.response_headers,
            response_body: input.response_body,
            error_message: input.error_message,
            created_at: Utc::now(),
        };
        tables.runs.insert(run.id, run.clone());
        Ok(run)
    }

    async fn list_runs(
        &self,
        user_id: Uuid,
        request_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<Run>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Run> = tables
            .runs
            .values()
            .filter(|r| r.user_id == user_id && request_id.map_or(true, |id| r.request_id == id))
            .cloned()
            .collect();
        newest_first(&mut rows, |r| (r.started_at, r.created_at));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn get_run(&self, user_id: Uuid, id: Uuid) -> Result<Run, StoreError> {
        let tables = self.tables.read().await;
        tables
            .runs
            .get(&id)
            .filter(|r| r.user_id == user_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("run", id))
    }

    async fn delete_run(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        match tables.runs.get(&id) {
            Some(r) if r.user_id == user_id => {}
            _ => return Err(StoreError::not_found("run", id)),
        }
        tables.runs.remove(&id);
        Ok(())
    }

    async fn clear_runs(&self, user_id: Uuid, request_id: Uuid) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.runs.len();
        tables
            .runs
            .retain(|_, r| !(r.request_id == request_id && r.user_id == user_id));
        Ok((before - tables.runs.len()) as u64)
    }
}
