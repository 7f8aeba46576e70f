use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::validation::{FieldErrors, ValidationError, STATUS_TEXT_MAX};

/// One logged execution of a saved request. Runs are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Run {
    pub id: Uuid,
    pub request_id: Uuid,
    pub user_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status_code: Option<i32>,
    pub status_text: Option<String>,
    pub duration_ms: Option<i64>,
    pub response_headers: Option<Value>,
    pub response_body: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Run result reported by whatever executed the request
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewRun {
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status_code: Option<i32>,
    #[serde(default)]
    pub status_text: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<i64>,
    #[serde(default)]
    pub response_headers: Option<Value>,
    #[serde(default)]
    pub response_body: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl NewRun {
    pub fn validated(self) -> Result<Self, ValidationError> {
        let mut errors = FieldErrors::new();

        if let Some(code) = self.status_code {
            if !(100..=599).contains(&code) {
                errors.add("status_code", "Must be between 100 and 599");
            }
        }
        if let Some(ms) = self.duration_ms {
            if ms < 0 {
                errors.add("duration_ms", "Must not be negative");
            }
        }
        if let Some(completed) = self.completed_at {
            if completed < self.started_at {
                errors.add("completed_at", "Must not be before started_at");
            }
        }
        let status_text = errors.optional_text("status_text", self.status_text, STATUS_TEXT_MAX);
        let response_headers = errors.json_collection("response_headers", self.response_headers);
        let error_message = self.error_message.filter(|m| !m.trim().is_empty());
        errors.finish()?;

        Ok(Self {
            status_text,
            response_headers,
            error_message,
            ..self
        })
    }
}
