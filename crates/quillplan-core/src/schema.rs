use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Result, SchemaError};
use crate::path::JsonPath;

/// Primitive JSON types understood by the schema subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JsonType {
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
    Null,
    /// Any type name outside the supported subset, kept verbatim.
    Unknown(String),
}

impl From<String> for JsonType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "object" => Self::Object,
            "array" => Self::Array,
            "string" => Self::String,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "null" => Self::Null,
            _ => Self::Unknown(name),
        }
    }
}

impl From<JsonType> for String {
    fn from(json_type: JsonType) -> Self {
        match json_type {
            JsonType::Object => "object".to_string(),
            JsonType::Array => "array".to_string(),
            JsonType::String => "string".to_string(),
            JsonType::Integer => "integer".to_string(),
            JsonType::Number => "number".to_string(),
            JsonType::Boolean => "boolean".to_string(),
            JsonType::Null => "null".to_string(),
            JsonType::Unknown(name) => name,
        }
    }
}

/// `type` keyword: a single type name or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSpec {
    Single(JsonType),
    Union(Vec<JsonType>),
}

/// Recursive node of a JSON-Schema-like contract.
///
/// Only the keywords the planner relies on are modelled; everything else is
/// dropped on deserialization. A node carrying `const` ignores `type` and
/// `enum` when a value is derived from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<TypeSpec>,
    #[serde(
        rename = "const",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_value"
    )]
    pub const_value: Option<Value>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    /// Declaration order is kept; skeletons list keys in the same order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
    #[serde(rename = "minItems", default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(rename = "maxItems", default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<Box<SchemaNode>>,
    #[serde(rename = "minContains", default, skip_serializing_if = "Option::is_none")]
    pub min_contains: Option<u64>,
    #[serde(rename = "allOf", default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaNode>,
}

/// `const: null` is a real constraint, so presence must survive deserialization.
fn present_value<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl SchemaNode {
    /// Parse a node tree from its JSON wire form.
    pub fn from_json(value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(|err| SchemaError::Malformed(err.to_string()))
    }

    /// Parse a node tree from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| SchemaError::Malformed(err.to_string()))
    }

    /// Serialize the node tree back to its wire form.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Node with only `type` set.
    pub fn typed(json_type: JsonType) -> Self {
        Self {
            schema_type: Some(TypeSpec::Single(json_type)),
            ..Self::default()
        }
    }

    /// Type used when a value has to be synthesized for this node.
    pub fn effective_type(&self) -> Option<JsonType> {
        match &self.schema_type {
            Some(TypeSpec::Single(json_type)) => Some(json_type.clone()),
            Some(TypeSpec::Union(types)) => types
                .iter()
                .find(|json_type| **json_type != JsonType::Null)
                .or_else(|| types.first())
                .cloned(),
            None if !self.properties.is_empty() => Some(JsonType::Object),
            None if self.items.is_some() => Some(JsonType::Array),
            None => None,
        }
    }

    /// Property names an instance must carry; defaults to every declared property.
    pub fn required_names(&self) -> Vec<&str> {
        match &self.required {
            Some(required) => required.iter().map(String::as_str).collect(),
            None => self.properties.keys().map(String::as_str).collect(),
        }
    }

    /// Follow `properties` along a dotted path.
    pub fn resolve(&self, path: &JsonPath) -> Option<&SchemaNode> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| node.properties.get(segment))
    }

    /// Mutable variant of [`SchemaNode::resolve`].
    pub fn resolve_mut(&mut self, path: &JsonPath) -> Option<&mut SchemaNode> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| node.properties.get_mut(segment))
    }

    /// Like [`SchemaNode::resolve_mut`] but fails with a schema error.
    pub fn require_mut(&mut self, path: &JsonPath) -> Result<&mut SchemaNode> {
        self.resolve_mut(path)
            .ok_or_else(|| SchemaError::UnresolvedPath(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_explicit_null_const() {
        let node = SchemaNode::from_json(&json!({"type": "string", "const": null}))
            .expect("parse node");
        assert_eq!(node.const_value, Some(Value::Null));

        let absent = SchemaNode::from_json(&json!({"type": "string"})).expect("parse node");
        assert_eq!(absent.const_value, None);
    }

    #[test]
    fn effective_type_prefers_non_null_member() {
        let node = SchemaNode::from_json(&json!({"type": ["null", "string"]})).expect("parse");
        assert_eq!(node.effective_type(), Some(JsonType::String));

        let only_null = SchemaNode::from_json(&json!({"type": ["null"]})).expect("parse");
        assert_eq!(only_null.effective_type(), Some(JsonType::Null));
    }

    #[test]
    fn effective_type_is_inferred_from_shape() {
        let object = SchemaNode::from_json(&json!({"properties": {"a": {"type": "integer"}}}))
            .expect("parse");
        assert_eq!(object.effective_type(), Some(JsonType::Object));

        let array = SchemaNode::from_json(&json!({"items": {"type": "string"}})).expect("parse");
        assert_eq!(array.effective_type(), Some(JsonType::Array));

        let unknown = SchemaNode::from_json(&json!({"type": "date"})).expect("parse");
        assert_eq!(unknown.effective_type(), Some(JsonType::Unknown("date".to_string())));
    }

    #[test]
    fn unknown_type_names_survive_round_trip() {
        let wire = json!({"type": ["null", "date-time"], "properties": {"at": {"type": "date"}}});
        let node = SchemaNode::from_json(&wire).expect("parse");
        assert_eq!(node.to_json(), wire);
    }

    #[test]
    fn properties_keep_declaration_order() {
        let node = SchemaNode::from_json_str(
            r#"{"type": "object", "properties": {"zeta": {"type": "string"}, "alpha": {"type": "integer"}, "mid": {"type": "boolean"}}}"#,
        )
        .expect("parse");
        let names: Vec<&str> = node.properties.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(
            node.to_json().to_string(),
            r#"{"type":"object","properties":{"zeta":{"type":"string"},"alpha":{"type":"integer"},"mid":{"type":"boolean"}}}"#
        );
    }

    #[test]
    fn resolves_nested_properties() {
        let node = SchemaNode::from_json(&json!({
            "type": "object",
            "properties": {
                "constraints": {
                    "type": "object",
                    "properties": {"tone": {"type": "string"}}
                }
            }
        }))
        .expect("parse");

        let path: JsonPath = "constraints.tone".parse().expect("path");
        assert!(node.resolve(&path).is_some());
        let missing: JsonPath = "constraints.pace".parse().expect("path");
        assert!(node.resolve(&missing).is_none());
    }

    #[test]
    fn wire_round_trip_keeps_keyword_names() {
        let wire = json!({
            "type": "array",
            "minItems": 2,
            "maxItems": 2,
            "items": {"type": "object", "additionalProperties": false}
        });
        let node = SchemaNode::from_json(&wire).expect("parse");
        assert_eq!(node.to_json(), wire);
    }
}
