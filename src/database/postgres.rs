use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::models::{
    Collection, CollectionPatch, CollectionSummary, NewCollection, NewRequest, NewRun, RequestPatch,
    RequestScope, Run, SavedRequest,
};
use super::store::{Store, StoreError};

const COLLECTION_COLUMNS: &str = "id, user_id, name, description, icon, created_at, updated_at";

const REQUEST_COLUMNS: &str = "id, collection_id, user_id, name, method, url, query_params, headers, \
     body_mode, body_content, auth_mode, auth_config, created_at, updated_at";

const RUN_COLUMNS: &str = "id, request_id, user_id, started_at, completed_at, status_code, status_text, \
     duration_ms, response_headers, response_body, error_message, created_at";

/// Postgres-backed store. Each operation is a single ownership-scoped statement.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Foreign key violations mean the parent row vanished between the
/// ownership check and the write.
fn map_write_error(err: sqlx::Error, parent: &'static str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some("23503") {
            return StoreError::MissingParent(parent);
        }
    }
    StoreError::Sqlx(err)
}

fn deleted_or_missing(rows: u64, resource: &'static str, id: Uuid) -> Result<(), StoreError> {
    if rows == 0 {
        return Err(StoreError::not_found(resource, id));
    }
    Ok(())
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_collections(&self, user_id: Uuid) -> Result<Vec<CollectionSummary>, StoreError> {
        let rows = sqlx::query_as::<_, CollectionSummary>(
            r#"
            SELECT
                c.id, c.user_id, c.name, c.description, c.icon, c.created_at, c.updated_at,
                COUNT(r.id) AS request_count
            FROM collections c
            LEFT JOIN requests r ON r.collection_id = c.id
            WHERE c.user_id = $1
            GROUP BY c.id
            ORDER BY c.updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn get_collection(&self, user_id: Uuid, id: Uuid) -> Result<Collection, StoreError> {
        let sql = format!("SELECT {COLLECTION_COLUMNS} FROM collections WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Collection>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("collection", id))
    }

    async fn create_collection(&self, user_id: Uuid, input: NewCollection) -> Result<Collection, StoreError> {
        let sql = format!(
            "INSERT INTO collections (id, user_id, name, description, icon) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COLLECTION_COLUMNS}"
        );
        let collection = sqlx::query_as::<_, Collection>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.icon)
            .fetch_one(&self.pool)
            .await?;

        debug!("Inserted collection {}", collection.id);
        Ok(collection)
    }

    async fn update_collection(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: CollectionPatch,
    ) -> Result<Collection, StoreError> {
        // Nullable columns carry a presence flag so an explicit null clears them
        let sql = format!(
            r#"
            UPDATE collections SET
                name = COALESCE($3, name),
                description = CASE WHEN $4 THEN $5 ELSE description END,
                icon = CASE WHEN $6 THEN $7 ELSE icon END,
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {COLLECTION_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Collection>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(patch.name.clone().flatten())
            .bind(patch.description.is_some())
            .bind(patch.description.clone().flatten())
            .bind(patch.icon.is_some())
            .bind(patch.icon.clone().flatten())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("collection", id))
    }

    async fn delete_collection(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM collections WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        deleted_or_missing(result.rows_affected(), "collection", id)
    }

    async fn list_requests(&self, user_id: Uuid, scope: RequestScope) -> Result<Vec<SavedRequest>, StoreError> {
        let (collection_id, ungrouped) = match scope {
            RequestScope::All => (None, false),
            RequestScope::Collection(id) => (Some(id), false),
            RequestScope::Ungrouped => (None, true),
        };

        let sql = format!(
            r#"
            SELECT {REQUEST_COLUMNS} FROM requests
            WHERE user_id = $1
              AND ($2::uuid IS NULL OR collection_id = $2)
              AND (NOT $3 OR collection_id IS NULL)
            ORDER BY updated_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, SavedRequest>(&sql)
            .bind(user_id)
            .bind(collection_id)
            .bind(ungrouped)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn get_request(&self, user_id: Uuid, id: Uuid) -> Result<SavedRequest, StoreError> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, SavedRequest>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("request", id))
    }

    async fn create_request(&self, user_id: Uuid, input: NewRequest) -> Result<SavedRequest, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO requests (
                id, collection_id, user_id, name, method, url, query_params, headers,
                body_mode, body_content, auth_mode, auth_config
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {REQUEST_COLUMNS}
            "#
        );
        let request = sqlx::query_as::<_, SavedRequest>(&sql)
            .bind(Uuid::new_v4())
            .bind(input.collection_id)
            .bind(user_id)
            .bind(&input.name)
            .bind(input.method_or_default())
            .bind(&input.url)
            .bind(&input.query_params)
            .bind(&input.headers)
            .bind(&input.body_mode)
            .bind(&input.body_content)
            .bind(&input.auth_mode)
            .bind(&input.auth_config)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "collection"))?;

        debug!("Inserted request {}", request.id);
        Ok(request)
    }

    async fn update_request(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: RequestPatch,
    ) -> Result<SavedRequest, StoreError> {
        let sql = format!(
            r#"
            UPDATE requests SET
                collection_id = CASE WHEN $3 THEN $4 ELSE collection_id END,
                name = COALESCE($5, name),
                method = COALESCE($6, method),
                url = COALESCE($7, url),
                query_params = CASE WHEN $8 THEN $9 ELSE query_params END,
                headers = CASE WHEN $10 THEN $11 ELSE headers END,
                body_mode = CASE WHEN $12 THEN $13 ELSE body_mode END,
                body_content = CASE WHEN $14 THEN $15 ELSE body_content END,
                auth_mode = CASE WHEN $16 THEN $17 ELSE auth_mode END,
                auth_config = CASE WHEN $18 THEN $19 ELSE auth_config END,
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {REQUEST_COLUMNS}
            "#
        );
        sqlx::query_as::<_, SavedRequest>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(patch.collection_id.is_some())
            .bind(patch.collection_id.flatten())
            .bind(patch.name.clone().flatten())
            .bind(patch.method.clone().flatten())
            .bind(patch.url.clone().flatten())
            .bind(patch.query_params.is_some())
            .bind(patch.query_params.clone().flatten())
            .bind(patch.headers.is_some())
            .bind(patch.headers.clone().flatten())
            .bind(patch.body_mode.is_some())
            .bind(patch.body_mode.clone().flatten())
            .bind(patch.body_content.is_some())
            .bind(patch.body_content.clone().flatten())
            .bind(patch.auth_mode.is_some())
            .bind(patch.auth_mode.clone().flatten())
            .bind(patch.auth_config.is_some())
            .bind(patch.auth_config.clone().flatten())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "collection"))?
            .ok_or_else(|| StoreError::not_found("request", id))
    }

    async fn delete_request(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM requests WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        deleted_or_missing(result.rows_affected(), "request", id)
    }

    async fn create_run(&self, user_id: Uuid, request_id: Uuid, input: NewRun) -> Result<Run, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO runs (
                id, request_id, user_id, started_at, completed_at, status_code, status_text,
                duration_ms, response_headers, response_body, error_message
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {RUN_COLUMNS}
            "#
        );
        let run = sqlx::query_as::<_, Run>(&sql)
            .bind(Uuid::new_v4())
            .bind(request_id)
            .bind(user_id)
            .bind(input.started_at)
            .bind(input.completed_at)
            .bind(input.status_code)
            .bind(&input.status_text)
            .bind(input.duration_ms)
            .bind(&input.response_headers)
            .bind(&input.response_body)
            .bind(&input.error_message)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "request"))?;

        debug!("Logged run {} for request {}", run.id, request_id);
        Ok(run)
    }

    async fn list_runs(
        &self,
        user_id: Uuid,
        request_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<Run>, StoreError> {
        let sql = format!(
            r#"
            SELECT {RUN_COLUMNS} FROM runs
            WHERE user_id = $1
              AND ($2::uuid IS NULL OR request_id = $2)
            ORDER BY started_at DESC, created_at DESC
            LIMIT $3
            "#
        );
        let rows = sqlx::query_as::<_, Run>(&sql)
            .bind(user_id)
            .bind(request_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn get_run(&self, user_id: Uuid, id: Uuid) -> Result<Run, StoreError> {
        let sql = format!("SELECT {RUN_COLUMNS} FROM runs WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Run>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("run", id))
    }

    async fn delete_run(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM runs WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        deleted_or_missing(result.rows_affected(), "run", id)
    }

    async fn clear_runs(&self, user_id: Uuid, request_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM runs WHERE request_id = $1 AND user_id = $2")
            .bind(request_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
