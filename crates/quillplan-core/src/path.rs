use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SchemaError;

/// Dotted path into a schema or a JSON document (`constraints.pov.type`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JsonPath {
    segments: Vec<String>,
}

impl JsonPath {
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Final segment of the path.
    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Path without its final segment; `None` for single-segment paths.
    pub fn parent(&self) -> Option<JsonPath> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(JsonPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Append a segment.
    pub fn join(&self, segment: &str) -> JsonPath {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        JsonPath { segments }
    }
}

impl FromStr for JsonPath {
    type Err = SchemaError;

    fn from_str(dotted: &str) -> Result<Self, Self::Err> {
        let segments: Vec<String> = dotted.split('.').map(str::to_string).collect();
        if segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(SchemaError::InvalidPath {
                path: dotted.to_string(),
                reason: "empty segment".to_string(),
            });
        }
        Ok(Self { segments })
    }
}

impl TryFrom<String> for JsonPath {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JsonPath> for String {
    fn from(path: JsonPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Read the value at `path`, if every segment resolves through objects.
pub fn get_path<'a>(root: &'a Value, path: &JsonPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(root, |value, segment| value.as_object()?.get(segment))
}

/// Mutable variant of [`get_path`].
pub fn get_path_mut<'a>(root: &'a mut Value, path: &JsonPath) -> Option<&'a mut Value> {
    path.segments()
        .iter()
        .try_fold(root, |value, segment| value.as_object_mut()?.get_mut(segment))
}

/// Write `value` at `path`.
///
/// Missing intermediate objects are created; intermediates that are not
/// objects (including the root) are replaced by empty objects first.
pub fn set_path(root: &mut Value, path: &JsonPath, value: Value) {
    let mut current = root;
    for segment in &path.segments()[..path.segments().len() - 1] {
        let map = ensure_object(current);
        current = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    ensure_object(current).insert(path.leaf().to_string(), value);
}

/// Remove and return the value at `path`.
pub fn take_path(root: &mut Value, path: &JsonPath) -> Option<Value> {
    match path.parent() {
        Some(parent) => get_path_mut(root, &parent)?
            .as_object_mut()?
            .shift_remove(path.leaf()),
        None => root.as_object_mut()?.shift_remove(path.leaf()),
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced by an object"),
    }
}
