use quillplan_core::SchemaNode;
use serde_json::Value;

use crate::model::EnforcementReport;

/// Drop top-level keys the schema does not declare, then descend into
/// declared values and drop undeclared keys wherever a nested object schema
/// forbids additional properties.
pub(crate) fn strip_unknown(document: &mut Value, schema: &SchemaNode, report: &mut EnforcementReport) {
    let Some(map) = document.as_object_mut() else {
        return;
    };

    map.retain(|key, _| {
        let keep = schema.properties.contains_key(key);
        if !keep {
            report.record_stripped(key.clone());
        }
        keep
    });

    for (key, value) in map.iter_mut() {
        if let Some(node) = schema.properties.get(key) {
            strip_nested(value, node, key, report);
        }
    }
}

fn strip_nested(value: &mut Value, node: &SchemaNode, path: &str, report: &mut EnforcementReport) {
    match value {
        Value::Object(map) => {
            if node.additional_properties == Some(false) {
                map.retain(|key, _| {
                    let keep = node.properties.contains_key(key);
                    if !keep {
                        report.record_stripped(format!("{path}.{key}"));
                    }
                    keep
                });
            }
            for (key, child) in map.iter_mut() {
                if let Some(child_node) = node.properties.get(key) {
                    strip_nested(child, child_node, &format!("{path}.{key}"), report);
                }
            }
        }
        Value::Array(items) => {
            if let Some(item_node) = node.items.as_deref() {
                for (idx, item) in items.iter_mut().enumerate() {
                    strip_nested(item, item_node, &format!("{path}[{idx}]"), report);
                }
            }
        }
        _ => {}
    }
}
