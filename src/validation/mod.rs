//! Input validation for collection, request and run payloads.
//!
//! Validators collect every field problem before failing so clients get the
//! full `field_errors` map in one round trip.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

pub const NAME_MAX: usize = 255;
pub const DESCRIPTION_MAX: usize = 2000;
pub const ICON_MAX: usize = 64;
pub const URL_MAX: usize = 2048;
pub const STATUS_TEXT_MAX: usize = 255;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("At least one updatable field must be provided")]
    EmptyUpdate,

    #[error("Invalid input")]
    Fields(HashMap<String, String>),
}

#[cfg(test)]
impl ValidationError {
    pub fn field_errors(&self) -> Option<&HashMap<String, String>> {
        match self {
            ValidationError::Fields(errors) => Some(errors),
            ValidationError::EmptyUpdate => None,
        }
    }
}

/// Accumulates per-field errors while normalizing input values
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        // First problem per field wins
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Fields(self.errors))
        }
    }

    /// Patch value for a NOT NULL column: an explicit null is an error
    pub fn non_null<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.add(field, "This field cannot be null");
        }
        value
    }

    /// Required text: trimmed, non-empty, bounded
    pub fn required_text(&mut self, field: &str, value: &str, max: usize) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.add(field, "This field is required");
        } else if trimmed.chars().count() > max {
            self.add(field, format!("Must be at most {} characters", max));
        }
        trimmed.to_string()
    }

    /// Optional text: trimmed and bounded; blank collapses to None
    pub fn optional_text(&mut self, field: &str, value: Option<String>, max: usize) -> Option<String> {
        let value = value?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.chars().count() > max {
            self.add(field, format!("Must be at most {} characters", max));
        }
        Some(trimmed.to_string())
    }

    /// Parse a keyword field into its enum, reporting the allowed values on failure
    pub fn keyword<K>(&mut self, field: &str, value: &str) -> Option<K>
    where
        K: Keyword,
    {
        match value.trim().parse::<K>() {
            Ok(k) => Some(k),
            Err(_) => {
                self.add(field, format!("Must be one of: {}", K::ALLOWED.join(", ")));
                None
            }
        }
    }

    pub fn optional_keyword<K>(&mut self, field: &str, value: Option<String>) -> Option<String>
    where
        K: Keyword,
    {
        let value = value?;
        if value.trim().is_empty() {
            return None;
        }
        self.keyword::<K>(field, &value).map(|k| k.as_str().to_string())
    }

    /// JSON array or object (key/value lists). A string is taken as the
    /// serialized form and decoded first.
    pub fn json_collection(&mut self, field: &str, value: Option<Value>) -> Option<Value> {
        match self.decode_json(field, value)? {
            v @ (Value::Array(_) | Value::Object(_)) => Some(v),
            _ => {
                self.add(field, "Must be a JSON array or object");
                None
            }
        }
    }

    pub fn json_object(&mut self, field: &str, value: Option<Value>) -> Option<Value> {
        match self.decode_json(field, value)? {
            v @ Value::Object(_) => Some(v),
            _ => {
                self.add(field, "Must be a JSON object");
                None
            }
        }
    }

    fn decode_json(&mut self, field: &str, value: Option<Value>) -> Option<Value> {
        match value? {
            Value::Null => None,
            Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Null) => None,
                Ok(decoded) => Some(decoded),
                Err(_) => {
                    self.add(field, "Must be valid JSON");
                    None
                }
            },
            other => Some(other),
        }
    }

    pub fn url(&mut self, field: &str, value: &str) -> String {
        let url = self.required_text(field, value, URL_MAX);
        if url.chars().any(char::is_whitespace) {
            self.add(field, "Must not contain whitespace");
        }
        url
    }
}

/// Closed vocabularies stored as text columns
pub trait Keyword: FromStr + Sized {
    const ALLOWED: &'static [&'static str];
    fn as_str(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownKeyword;

impl fmt::Display for UnknownKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown keyword")
    }
}

macro_rules! keyword_enum {
    ($name:ident { $($variant:ident => $text:expr),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl Keyword for $name {
            const ALLOWED: &'static [&'static str] = &[$($text),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownKeyword;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($text) {
                        return Ok($name::$variant);
                    }
                )+
                Err(UnknownKeyword)
            }
        }
    };
}

keyword_enum!(HttpMethod {
    Get => "GET",
    Post => "POST",
    Put => "PUT",
    Patch => "PATCH",
    Delete => "DELETE",
    Head => "HEAD",
    Options => "OPTIONS",
});

keyword_enum!(BodyMode {
    None => "none",
    Json => "json",
    Text => "text",
    Xml => "xml",
    FormData => "form-data",
    UrlEncoded => "x-www-form-urlencoded",
    Raw => "raw",
});

keyword_enum!(AuthMode {
    None => "none",
    Basic => "basic",
    Bearer => "bearer",
    ApiKey => "api-key",
});

/// Deserialize a field so that absent stays `None` while explicit `null`
/// becomes `Some(None)`. Pair with `#[serde(default)]`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Query-string number where an empty value (`?limit=`) means absent
pub fn blank_as_none<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: FromStr,
    T::Err: fmt::Display,
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_text_trims_and_bounds() {
        let mut errors = FieldErrors::new();
        assert_eq!(errors.required_text("name", "  Users  ", NAME_MAX), "Users");
        assert!(errors.is_empty());

        errors.required_text("name", "   ", NAME_MAX);
        errors.required_text("icon", &"x".repeat(ICON_MAX + 1), ICON_MAX);
        match errors.finish() {
            Err(ValidationError::Fields(map)) => {
                assert_eq!(map["name"], "This field is required");
                assert!(map["icon"].contains("64"));
            }
            other => panic!("expected field errors, got {:?}", other),
        }
    }

    #[test]
    fn optional_text_collapses_blank() {
        let mut errors = FieldErrors::new();
        assert_eq!(errors.optional_text("description", Some("  ".into()), 10), None);
        assert_eq!(errors.optional_text("description", None, 10), None);
        assert_eq!(errors.optional_text("description", Some(" hi ".into()), 10), Some("hi".into()));
        assert!(errors.is_empty());
    }

    #[test]
    fn methods_are_case_insensitive_and_canonical() {
        assert_eq!("get".parse::<HttpMethod>(), Ok(HttpMethod::Get));
        assert_eq!(HttpMethod::Options.as_str(), "OPTIONS");
        assert!("TRACE".parse::<HttpMethod>().is_err());

        let mut errors = FieldErrors::new();
        assert_eq!(errors.optional_keyword::<BodyMode>("body_mode", Some("JSON".into())), Some("json".into()));
        assert_eq!(errors.optional_keyword::<AuthMode>("auth_mode", Some("oauth".into())), None);
        let err = errors.finish().unwrap_err();
        assert!(err.field_errors().unwrap()["auth_mode"].contains("api-key"));
    }

    #[test]
    fn json_shapes() {
        let mut errors = FieldErrors::new();
        assert_eq!(errors.json_collection("headers", Some(json!([{"key": "a"}]))), Some(json!([{"key": "a"}])));
        assert_eq!(errors.json_collection("headers", Some(Value::Null)), None);
        assert!(errors.is_empty());
        assert_eq!(errors.json_collection("headers", Some(json!("x"))), None);
        assert_eq!(errors.json_object("auth_config", Some(json!("[1]"))), None);
        assert_eq!(errors.json_object("auth_config", Some(json!([1]))), None);
        let err = errors.finish().unwrap_err();
        let map = err.field_errors().unwrap();
        assert!(map.contains_key("headers"));
        assert!(map.contains_key("auth_config"));
    }

    #[test]
    fn serialized_json_is_decoded() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            errors.json_collection("headers", Some(json!(r#"[{"key":"Accept","value":"*/*"}]"#))),
            Some(json!([{ "key": "Accept", "value": "*/*" }]))
        );
        assert_eq!(
            errors.json_object("auth_config", Some(json!(r#"{"token":"abc"}"#))),
            Some(json!({ "token": "abc" }))
        );
        assert_eq!(errors.json_collection("headers", Some(json!("null"))), None);
        assert!(errors.is_empty());

        errors.json_collection("headers", Some(json!("Accept: */*")));
        let err = errors.finish().unwrap_err();
        assert_eq!(err.field_errors().unwrap()["headers"], "Must be valid JSON");
    }

    #[test]
    fn non_null_flags_explicit_null() {
        let mut errors = FieldErrors::new();
        assert_eq!(errors.non_null("name", Some("x")), Some("x"));
        assert!(errors.is_empty());
        assert_eq!(errors.non_null::<&str>("url", None), None);
        let err = errors.finish().unwrap_err();
        assert_eq!(err.field_errors().unwrap()["url"], "This field cannot be null");
    }

    #[test]
    fn nullable_distinguishes_absent_and_null() {
        #[derive(Deserialize)]
        struct Patch {
            #[serde(default, deserialize_with = "nullable")]
            icon: Option<Option<String>>,
        }

        let absent: Patch = serde_json::from_value(json!({})).unwrap();
        assert_eq!(absent.icon, None);
        let cleared: Patch = serde_json::from_value(json!({ "icon": null })).unwrap();
        assert_eq!(cleared.icon, Some(None));
        let set: Patch = serde_json::from_value(json!({ "icon": "rocket" })).unwrap();
        assert_eq!(set.icon, Some(Some("rocket".into())));
    }

    #[test]
    fn url_rejects_whitespace() {
        let mut errors = FieldErrors::new();
        errors.url("url", "{{base}}/users");
        assert!(errors.is_empty());
        errors.url("url", "http://a b");
        assert!(!errors.is_empty());
    }
}
