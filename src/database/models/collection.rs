use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::validation::{nullable, FieldErrors, ValidationError, DESCRIPTION_MAX, ICON_MAX, NAME_MAX};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Collection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Collection row as listed, with the number of requests it groups
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CollectionSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub collection: Collection,
    pub request_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewCollection {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl NewCollection {
    pub fn validated(self) -> Result<Self, ValidationError> {
        let mut errors = FieldErrors::new();
        let name = errors.required_text("name", &self.name, NAME_MAX);
        let description = errors.optional_text("description", self.description, DESCRIPTION_MAX);
        let icon = errors.optional_text("icon", self.icon, ICON_MAX);
        errors.finish()?;

        Ok(Self { name, description, icon })
    }
}

/// Partial update. `None` keeps the stored value, `Some(None)` clears it.
/// `name` is NOT NULL, so a null there is rejected by `validated`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionPatch {
    #[serde(default, deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub icon: Option<Option<String>>,
}

impl CollectionPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.icon.is_none()
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
        let description = self
            .description
            .map(|d| errors.optional_text("description", d, DESCRIPTION_MAX));
        let icon = self.icon.map(|i| errors.optional_text("icon", i, ICON_MAX));
        errors.finish()?;

        Ok(Self { name, description, icon })
    }

    /// Merge present fields into a stored collection
    pub fn apply(&self, collection: &mut Collection) {
        if let Some(Some(name)) = &self.name {
            collection.name = name.clone();
        }
        if let Some(description) = &self.description {
            collection.description = description.clone();
        }
        if let Some(icon) = &self.icon {
            collection.icon = icon.clone();
        }
    }
}
