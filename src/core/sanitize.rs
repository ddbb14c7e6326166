//! Masking and stripping of sensitive fields in JSON values
//!
//! Fields are matched by name at any nesting depth, not by path: a field
//! named `password` is treated the same at the root and inside nested
//! objects. Arrays are traversed element by element, so objects inside
//! arrays are sanitized too.
//!
//! # Example
//!
//! ```rust
//! use backbone::core::sanitize::{SensitiveFields, sanitize_object_default};
//! use serde_json::json;
//!
//! let body = json!({"email": "a@b.c", "password": "hunter2"});
//! let clean = sanitize_object_default(&body, &SensitiveFields::new(["password"]));
//!
//! assert_eq!(clean, json!({"email": "a@b.c", "password": "[REDACTED]"}));
//! ```

use serde_json::{Map, Value};
use std::collections::HashSet;

/// Replacement written in place of a masked value
pub const DEFAULT_MASK: &str = "[REDACTED]";

/// Set of field names whose values must never leave the process unmasked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensitiveFields(HashSet<String>);

impl SensitiveFields {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(names.into_iter().map(|n| n.as_ref().to_string()).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for SensitiveFields {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<S: AsRef<str>> Extend<S> for SensitiveFields {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0
            .extend(iter.into_iter().map(|n| n.as_ref().to_string()));
    }
}

/// Return a copy of `value` with every sensitive field replaced by `mask`
///
/// The replacement happens regardless of the original value's type. Scalars
/// are returned as-is.
pub fn sanitize_object(value: &Value, sensitive: &SensitiveFields, mask: &str) -> Value {
    match value {
        Value::Object(map) => {
            let masked: Map<String, Value> = map
                .iter()
                .map(|(key, v)| {
                    let v = if sensitive.contains(key) {
                        Value::String(mask.to_string())
                    } else {
                        sanitize_object(v, sensitive, mask)
                    };
                    (key.clone(), v)
                })
                .collect();
            Value::Object(masked)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| sanitize_object(item, sensitive, mask))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// [`sanitize_object`] with [`DEFAULT_MASK`]
pub fn sanitize_object_default(value: &Value, sensitive: &SensitiveFields) -> Value {
    sanitize_object(value, sensitive, DEFAULT_MASK)
}

/// Return a copy of `value` with every sensitive field removed
pub fn remove_sensitive_fields(value: &Value, sensitive: &SensitiveFields) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !sensitive.contains(key))
                .map(|(key, v)| (key.clone(), remove_sensitive_fields(v, sensitive)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| remove_sensitive_fields(item, sensitive))
                .collect(),
        ),
        other => other.clone(),
    }
}
