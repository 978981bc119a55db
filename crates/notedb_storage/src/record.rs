//! Stored record representation.

use crate::error::{StorageError, StorageResult};
use serde_json::{Map, Value};

/// A single stored record.
///
/// Records are JSON objects with a mandatory string `id` field. Nested
/// fields can be addressed with dotted paths (`content.type`).
#[derive(Debug, Clone, PartialEq)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Builds a record from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an object or has no string `id`.
    pub fn from_value(value: Value) -> StorageResult<Self> {
        match value {
            Value::Object(map) => {
                if !matches!(map.get("id"), Some(Value::String(id)) if !id.is_empty()) {
                    return Err(StorageError::InvalidRecord(
                        "record must carry a non-empty string `id`".into(),
                    ));
                }
                Ok(Self(map))
            }
            other => Err(StorageError::InvalidRecord(format!(
                "expected a JSON object, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Returns the record id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.0.get("id").and_then(Value::as_str).unwrap_or_default()
    }

    /// Looks up a field by name or dotted path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Sets a top-level field.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Returns the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Converts the record back into a JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_non_objects() {
        assert!(Record::from_value(json!([1, 2])).is_err());
        assert!(Record::from_value(json!("id")).is_err());
    }

    #[test]
    fn rejects_missing_or_empty_id() {
        assert!(Record::from_value(json!({ "title": "x" })).is_err());
        assert!(Record::from_value(json!({ "id": "" })).is_err());
        assert!(Record::from_value(json!({ "id": 7 })).is_err());
    }

    #[test]
    fn dotted_paths_reach_nested_fields() {
        let record =
            Record::from_value(json!({ "id": "n1", "content": { "type": "tiny" } })).unwrap();
        assert_eq!(record.id(), "n1");
        assert_eq!(record.get("content.type"), Some(&json!("tiny")));
        assert_eq!(record.get("content.data"), None);
        assert_eq!(record.get("missing.path"), None);
    }

    #[test]
    fn set_overwrites_field() {
        let mut record = Record::from_value(json!({ "id": "a", "deleted": false })).unwrap();
        record.set("deleted", json!(true));
        assert_eq!(record.get("deleted"), Some(&json!(true)));
    }
}
