//! JSON document under construction.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::HypermediaError;

/// A JSON object tree that mappers write into at path-addressed positions.
///
/// Keys are kept sorted, so equal documents always serialize identically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document(Map<String, Value>);

fn ensure_object(slot: &mut Value) -> &mut Map<String, Value> {
    match slot {
        Value::Object(map) => map,
        other => {
            *other = Value::Object(Map::new());
            ensure_object(other)
        }
    }
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Object at `path`, creating intermediate objects as needed.
    ///
    /// A non-object value found on the way is replaced by an object.
    pub fn object_at<S: AsRef<str>>(&mut self, path: &[S]) -> &mut Map<String, Value> {
        let mut current = &mut self.0;
        for segment in path {
            let slot = current
                .entry(segment.as_ref().to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            current = ensure_object(slot);
        }
        current
    }

    pub fn insert_at<S: AsRef<str>>(&mut self, path: &[S], key: &str, value: Value) {
        self.object_at(path).insert(key.to_owned(), value);
    }

    /// Append `value` to the array stored under `key` at `path`.
    pub fn push_at<S: AsRef<str>>(&mut self, path: &[S], key: &str, value: Value) {
        let slot = self
            .object_at(path)
            .entry(key.to_owned())
            .or_insert_with(|| Value::Array(Vec::new()));
        match slot {
            Value::Array(items) => items.push(value),
            other => *other = Value::Array(vec![value]),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// # Errors
    /// Returns `HypermediaError::Serialization` if the tree cannot be serialized.
    pub fn to_json(&self) -> Result<String, HypermediaError> {
        Ok(serde_json::to_string(&self.0)?)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Serializing a map of JSON values cannot fail.
        let raw = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(&raw)
    }
}
