use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LeafError, Result};

/// Field holding the document identifier.
pub const ID_FIELD: &str = "id";
/// Field stamped once when a document is first inserted.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Field refreshed on every insert and update.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// A schema-less record: an ordered map from field name to JSON value.
///
/// Field order is preserved through serialization, so a document read back
/// from disk lists its fields in the order they were written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: Map<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    /// Build a document from a JSON value. Only objects are documents.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(LeafError::InvalidDocument(format!(
                "expected a JSON object, got {}",
                kind_of(&other)
            ))),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The document id, when present and a string.
    pub fn id(&self) -> Option<&str> {
        self.fields.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn created_at(&self) -> Option<&str> {
        self.fields.get(CREATED_AT_FIELD).and_then(Value::as_str)
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.fields.get(UPDATED_AT_FIELD).and_then(Value::as_str)
    }

    /// Top-level field lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Resolve a dot-delimited path such as `address.city` or `tags.0`.
    ///
    /// Returns `None` when any segment is missing; a stored `null` comes back
    /// as `Some(Value::Null)`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.fields.get(first)?;
        for part in parts {
            current = match current {
                Value::Object(obj) => obj.get(part)?,
                Value::Array(arr) => part.parse::<usize>().ok().and_then(|i| arr.get(i))?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Shallow merge: every top-level field of `update` replaces the field of
    /// the same name here.
    pub fn merge(&mut self, update: &Document) {
        for (k, v) in &update.fields {
            self.fields.insert(k.clone(), v.clone());
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Stamp `createdAt` and `updatedAt` with the same instant.
    pub fn stamp_created(&mut self) {
        let now = timestamp_now();
        self.set(CREATED_AT_FIELD, now.clone());
        self.set(UPDATED_AT_FIELD, now);
    }

    pub fn stamp_updated(&mut self) {
        self.set(UPDATED_AT_FIELD, timestamp_now());
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl TryFrom<Value> for Document {
    type Error = LeafError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

/// Current UTC time as ISO-8601 with millisecond precision, e.g.
/// `2025-06-14T12:30:00.000Z`.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
