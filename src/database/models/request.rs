use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::validation::{
    nullable, AuthMode, BodyMode, FieldErrors, HttpMethod, Keyword, ValidationError, NAME_MAX,
};

/// A saved HTTP request definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SavedRequest {
    pub id: Uuid,
    pub collection_id: Option<Uuid>,
    pub user_id: Uuid,
    pub name: String,
    pub method: String,
    pub url: String,
    pub query_params: Option<Value>,
    pub headers: Option<Value>,
    pub body_mode: Option<String>,
    pub body_content: Option<String>,
    pub auth_mode: Option<String>,
    pub auth_config: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing filter for saved requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestScope {
    #[default]
    All,
    Collection(Uuid),
    Ungrouped,
}

impl RequestScope {
    pub fn matches(&self, request: &SavedRequest) -> bool {
        match self {
            RequestScope::All => true,
            RequestScope::Collection(id) => request.collection_id == Some(*id),
            RequestScope::Ungrouped => request.collection_id.is_none(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewRequest {
    #[serde(default)]
    pub collection_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub method: Option<String>,
    pub url: String,
    #[serde(default)]
    pub query_params: Option<Value>,
    #[serde(default)]
    pub headers: Option<Value>,
    #[serde(default)]
    pub body_mode: Option<String>,
    #[serde(default)]
    pub body_content: Option<String>,
    #[serde(default)]
    pub auth_mode: Option<String>,
    #[serde(default)]
    pub auth_config: Option<Value>,
}

impl NewRequest {
    /// Normalize and validate. Method defaults to GET and is stored upper-case.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let mut errors = FieldErrors::new();
        let name = errors.required_text("name", &self.name, NAME_MAX);
        let method = match self.method.as_deref() {
            None => HttpMethod::Get,
            Some(m) => errors.keyword::<HttpMethod>("method", m).unwrap_or(HttpMethod::Get),
        };
        let url = errors.url("url", &self.url);
        let query_params = errors.json_collection("query_params", self.query_params);
        let headers = errors.json_collection("headers", self.headers);
        let body_mode = errors.optional_keyword::<BodyMode>("body_mode", self.body_mode);
        let auth_mode = errors.optional_keyword::<AuthMode>("auth_mode", self.auth_mode);
        let auth_config = errors.json_object("auth_config", self.auth_config);
        errors.finish()?;

        Ok(Self {
            collection_id: self.collection_id,
            name,
            method: Some(method.as_str().to_string()),
            url,
            query_params,
            headers,
            body_mode,
            body_content: self.body_content,
            auth_mode,
            auth_config,
        })
    }

    /// Copy of an existing request, used by duplicate
    pub fn copy_of(source: &SavedRequest) -> Self {
        let mut name = format!("{} (copy)", source.name);
        if name.chars().count() > NAME_MAX {
            name = name.chars().take(NAME_MAX).collect();
        }

        Self {
            collection_id: source.collection_id,
            name,
            method: Some(source.method.clone()),
            url: source.url.clone(),
            query_params: source.query_params.clone(),
            headers: source.headers.clone(),
            body_mode: source.body_mode.clone(),
            body_content: source.body_content.clone(),
            auth_mode: source.auth_mode.clone(),
            auth_config: source.auth_config.clone(),
        }
    }

    pub fn method_or_default(&self) -> &str {
        self.method.as_deref().unwrap_or("GET")
    }
}

/// Partial update. Every field is `Option<Option<T>>` so an explicit `null`
/// is seen: it clears nullable columns and is rejected on NOT NULL ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestPatch {
    #[serde(default, deserialize_with = "nullable")]
    pub collection_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub method: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub query_params: Option<Option<Value>>,
    #[serde(default, deserialize_with = "nullable")]
    pub headers: Option<Option<Value>>,
    #[serde(default, deserialize_with = "nullable")]
    pub body_mode: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub body_content: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub auth_mode: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub auth_config: Option<Option<Value>>,
}

impl RequestPatch {
    pub fn is_empty(&self) -> bool {
        self.collection_id.is_none()
            && self.name.is_none()
            && self.method.is_none()
            && self.url.is_none()
            && self.query_params.is_none()
            && self.headers.is_none()
            && self.body_mode.is_none()
            && self.body_content.is_none()
            && self.auth_mode.is_none()
            && self.auth_config.is_none()
    }

    /// Collection the request is being moved into, if any
    pub fn target_collection(&self) -> Option<Uuid> {
        self.collection_id.flatten()
    }

    pub fn validated(self) -> Result<Self, ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyUpdate);
        }

        let mut errors = FieldErrors::new();
        let name = self.name.map(|n| {
            errors
                .non_null("name", n)
                .map(|n| errors.required_text("name", &n, NAME_MAX))
        });
        let method = self.method.map(|m| {
            errors.non_null("method", m).map(|m| {
                errors
                    .keyword::<HttpMethod>("method", &m)
                    .map(|k| k.as_str().to_string())
                    .unwrap_or(m)
            })
        });
        let url = self.url.map(|u| errors.non_null("url", u).map(|u| errors.url("url", &u)));
        let query_params = self.query_params.map(|v| errors.json_collection("query_params", v));
        let headers = self.headers.map(|v| errors.json_collection("headers", v));
        let body_mode = self.body_mode.map(|v| errors.optional_keyword::<BodyMode>("body_mode", v));
        let auth_mode = self.auth_mode.map(|v| errors.optional_keyword::<AuthMode>("auth_mode", v));
        let auth_config = self.auth_config.map(|v| errors.json_object("auth_config", v));
        errors.finish()?;

        Ok(Self {
            collection_id: self.collection_id,
            name,
            method,
            url,
            query_params,
            headers,
            body_mode,
            body_content: self.body_content,
            auth_mode,
            auth_config,
        })
    }

    /// Merge present fields into a stored request
    pub fn apply(&self, request: &mut SavedRequest) {
        if let Some(collection_id) = self.collection_id {
            request.collection_id = collection_id;
        }
        if let Some(Some(name)) = &self.name {
            request.name = name.clone();
        }
        if let Some(Some(method)) = &self.method {
            request.method = method.clone();
        }
        if let Some(Some(url)) = &self.url {
            request.url = url.clone();
        }
        if let Some(query_params) = &self.query_params {
            request.query_params = query_params.clone();
        }
        if let Some(headers) = &self.headers {
            request.headers = headers.clone();
        }
        if let Some(body_mode) = &self.body_mode {
            request.body_mode = body_mode.clone();
        }
        if let Some(body_content) = &self.body_content {
            request.body_content = body_content.clone();
        }
        if let Some(auth_mode) = &self.auth_mode {
            request.auth_mode = auth_mode.clone();
        }
        if let Some(auth_config) = &self.auth_config {
            request.auth_config = auth_config.clone();
        }
    }
}
