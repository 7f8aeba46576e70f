#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use api_tester::{app, auth, database::MemoryStore, AppState};

/// Router backed by an in-memory store, driven without a socket
pub struct TestApp {
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn id(&self) -> String {
        self.body["data"]["id"].as_str().unwrap_or_default().to_string()
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            router: app(AppState::new(MemoryStore::new())),
        }
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        user: Option<Uuid>,
        body: Option<Value>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(user) = user {
            let token = auth::token_for_user(user).context("failed to mint token")?;
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response was not JSON")?
        };

        Ok(TestResponse { status, body })
    }

    pub async fn get(&self, path: &str, user: Uuid) -> Result<TestResponse> {
        self.send(Method::GET, path, Some(user), None).await
    }

    pub async fn post(&self, path: &str, user: Uuid, body: Value) -> Result<TestResponse> {
        self.send(Method::POST, path, Some(user), Some(body)).await
    }

    pub async fn patch(&self, path: &str, user: Uuid, body: Value) -> Result<TestResponse> {
        self.send(Method::PATCH, path, Some(user), Some(body)).await
    }

    pub async fn delete(&self, path: &str, user: Uuid) -> Result<TestResponse> {
        self.send(Method::DELETE, path, Some(user), None).await
    }

    pub async fn create_collection(&self, user: Uuid, name: &str) -> Result<String> {
        let res = self.post("/api/collections", user, json!({ "name": name })).await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "collection create failed: {}", res.body);
        Ok(res.id())
    }

    pub async fn create_request(&self, user: Uuid, body: Value) -> Result<String> {
        let res = self.post("/api/requests", user, body).await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "request create failed: {}", res.body);
        Ok(res.id())
    }

    pub async fn log_run(&self, user: Uuid, request_id: &str, body: Value) -> Result<String> {
        let res = self
            .post(&format!("/api/requests/{}/runs", request_id), user, body)
            .await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "run create failed: {}", res.body);
        Ok(res.id())
    }
}

pub fn user() -> Uuid {
    Uuid::new_v4()
}
