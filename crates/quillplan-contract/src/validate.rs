use jsonschema::{Draft, JSONSchema};
use quillplan_core::{DocumentValidator, SchemaNode, ValidationIssue, ValidationReport};
use serde_json::Value;

use crate::errors::{ContractError, Result};

/// Compiled JSON Schema validator for a specialized contract.
pub struct JsonSchemaValidator {
    compiled: JSONSchema,
}

impl JsonSchemaValidator {
    /// Compile a specialized schema.
    ///
    /// The `$schema` marker is dropped and draft 7 semantics are used; the
    /// contract only relies on keywords draft 7 already understands.
    pub fn compile(schema: &SchemaNode) -> Result<Self> {
        let compiled = compile_value(&schema.to_json())?;
        Ok(Self { compiled })
    }
}

impl DocumentValidator for JsonSchemaValidator {
    fn validate(&self, document: &Value) -> ValidationReport {
        collect_issues(&self.compiled, document)
    }
}

/// Validate a document against a schema given in wire form.
pub fn validate_document_json(document: &Value, schema: &Value) -> Result<ValidationReport> {
    let compiled = compile_value(schema)?;
    Ok(collect_issues(&compiled, document))
}

fn compile_value(schema: &Value) -> Result<JSONSchema> {
    let mut schema = schema.clone();
    if let Some(map) = schema.as_object_mut() {
        map.remove("$schema");
    }
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema)
        .map_err(|err| ContractError::Compile(err.to_string()))
}

fn collect_issues(compiled: &JSONSchema, document: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(document) {
        for error in errors {
            let pointer = normalized_json_pointer(&error.instance_path.to_string());
            let keyword = failed_keyword(&error.schema_path.to_string());
            report.push(ValidationIssue::schema(pointer, keyword, error.to_string()));
        }
    }

    report
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}

/// Last segment of a schema path such as `/properties/ch/minimum`.
fn failed_keyword(schema_path: &str) -> Option<String> {
    schema_path
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && segment.parse::<usize>().is_err())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reports_pointer_paths() {
        let schema = json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "properties": {"ch": {"type": "integer", "minimum": 1}},
            "required": ["ch"]
        });

        let report = validate_document_json(&json!({"ch": 0}), &schema).expect("compile");
        assert!(!report.is_ok());
        assert_eq!(report.issues[0].pointer, "/ch");
        assert_eq!(report.issues[0].keyword.as_deref(), Some("minimum"));

        let report = validate_document_json(&json!({}), &schema).expect("compile");
        assert_eq!(report.issues[0].pointer, "/");
        assert_eq!(report.issues[0].keyword.as_deref(), Some("required"));

        let report = validate_document_json(&json!({"ch": 3}), &schema).expect("compile");
        assert!(report.is_ok());
    }

    #[test]
    fn const_and_contains_are_enforced() {
        let schema = SchemaNode::from_json(&json!({
            "type": "object",
            "properties": {
                "tone": {"type": "string", "const": "witty"},
                "rows": {"type": "array", "items": {"type": "object"}}
            },
            "allOf": [{"properties": {"rows": {
                "contains": {"type": "object", "properties": {"act": {"const": "III"}}},
                "minContains": 1
            }}}]
        }))
        .expect("schema");
        let validator = JsonSchemaValidator::compile(&schema).expect("compile");

        assert!(validator
            .validate(&json!({"tone": "witty", "rows": [{"act": "III"}]}))
            .is_ok());
        assert!(!validator
            .validate(&json!({"tone": "grim", "rows": [{"act": "III"}]}))
            .is_ok());
        assert!(!validator
            .validate(&json!({"tone": "witty", "rows": [{"act": "I"}]}))
            .is_ok());
    }
}
