use serde_json::{Map, Value};

use crate::schema::{JsonType, SchemaNode};

/// Derive the minimal instance a schema node admits.
///
/// Pure and deterministic: the same schema always yields the same value.
/// `const` wins over everything, then the first `enum` member, then a
/// per-type zero value. Objects carry only their required properties and
/// arrays are filled up to `minItems` (clamped by `maxItems`).
pub fn derive_skeleton(node: &SchemaNode) -> Value {
    if let Some(value) = &node.const_value {
        return value.clone();
    }
    if let Some(first) = node.enum_values.first() {
        return first.clone();
    }

    match node.effective_type() {
        Some(JsonType::Object) => {
            let mut object = Map::new();
            for name in node.required_names() {
                let value = node
                    .properties
                    .get(name)
                    .map(derive_skeleton)
                    .unwrap_or(Value::Null);
                object.insert(name.to_string(), value);
            }
            Value::Object(object)
        }
        Some(JsonType::Array) => {
            let mut count = node.min_items.unwrap_or(0);
            if let Some(max) = node.max_items
                && max < count
            {
                count = max;
            }
            let item = node
                .items
                .as_deref()
                .map(derive_skeleton)
                .unwrap_or(Value::Null);
            Value::Array((0..count).map(|_| item.clone()).collect())
        }
        Some(JsonType::String) => Value::String(String::new()),
        Some(JsonType::Integer) => Value::from(0),
        Some(JsonType::Number) => Value::from(0.0),
        Some(JsonType::Boolean) => Value::Bool(false),
        Some(JsonType::Null) | Some(JsonType::Unknown(_)) | None => Value::Null,
    }
}

/// Compact JSON text of a skeleton, as handed to the generator.
pub fn render_skeleton(skeleton: &Value) -> String {
    skeleton.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: Value) -> SchemaNode {
        SchemaNode::from_json(&value).expect("parse schema")
    }

    #[test]
    fn const_beats_enum_and_type() {
        let schema = node(json!({"type": "string", "enum": ["a", "b"], "const": {"x": 1}}));
        assert_eq!(derive_skeleton(&schema), json!({"x": 1}));

        let schema = node(json!({"type": "string", "enum": ["II", "III"]}));
        assert_eq!(derive_skeleton(&schema), json!("II"));
    }

    #[test]
    fn objects_follow_required_or_all_properties() {
        let schema = node(json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "role": {"type": "string"}
            },
            "required": ["name"]
        }));
        assert_eq!(derive_skeleton(&schema), json!({"name": ""}));

        let schema = node(json!({
            "properties": {
                "ch": {"type": "integer"},
                "figure": {"type": ["string", "null"]},
                "ratio": {"type": "number"},
                "done": {"type": "boolean"}
            }
        }));
        assert_eq!(
            derive_skeleton(&schema),
            json!({"ch": 0, "figure": "", "ratio": 0.0, "done": false})
        );
    }

    #[test]
    fn arrays_use_min_items_clamped_by_max_items() {
        let schema = node(json!({
            "type": "array",
            "minItems": 3,
            "items": {"type": "object", "properties": {"n": {"type": "integer"}}}
        }));
        assert_eq!(
            derive_skeleton(&schema),
            json!([{"n": 0}, {"n": 0}, {"n": 0}])
        );

        let clamped = node(json!({"type": "array", "minItems": 3, "maxItems": 1, "items": {"type": "string"}}));
        assert_eq!(derive_skeleton(&clamped), json!([""]));

        let empty = node(json!({"type": "array", "items": {"type": "string"}}));
        assert_eq!(derive_skeleton(&empty), json!([]));
    }

    #[test]
    fn unknown_or_missing_type_is_null() {
        assert_eq!(derive_skeleton(&node(json!({}))), Value::Null);
        assert_eq!(derive_skeleton(&node(json!({"type": "date"}))), Value::Null);
    }

    #[test]
    fn derivation_is_deterministic() {
        let schema = node(json!({
            "type": "object",
            "properties": {
                "b": {"type": "array", "minItems": 2, "items": {"type": "integer"}},
                "a": {"const": [1, 2, 3]},
                "c": {"type": "object", "properties": {"z": {"enum": [true]}}}
            }
        }));
        let first = render_skeleton(&derive_skeleton(&schema));
        let second = render_skeleton(&derive_skeleton(&schema));
        assert_eq!(first, second);
        assert_eq!(first, r#"{"b":[0,0],"a":[1,2,3],"c":{"z":true}}"#);
        assert_eq!(first, r#"{"a":[1,2,3],"b":[0,0],"c":{"z":true}}"#);
    }
}
