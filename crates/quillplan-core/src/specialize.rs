use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::error::{Result, SchemaError};
use crate::path::JsonPath;
use crate::schema::{JsonType, SchemaNode};

/// Required entry count per category of a designated array.
///
/// Category order is the order given at construction and is treated as the
/// canonical order everywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardinalityLock {
    counts: Vec<(String, usize)>,
    total: usize,
}

impl CardinalityLock {
    /// Build a lock, failing fast unless the counts sum to `expected_total`.
    pub fn new<I, S>(counts: I, expected_total: i64) -> Result<Self>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        if expected_total <= 0 {
            return Err(SchemaError::InvalidCardinality(format!(
                "total must be positive, got {expected_total}"
            )));
        }

        let mut seen = BTreeSet::new();
        let mut resolved = Vec::new();
        let mut sum = 0_i64;
        for (category, count) in counts {
            let category = category.into();
            if count < 0 {
                return Err(SchemaError::InvalidCardinality(format!(
                    "category '{category}' has negative count {count}"
                )));
            }
            if !seen.insert(category.clone()) {
                return Err(SchemaError::InvalidCardinality(format!(
                    "category '{category}' listed twice"
                )));
            }
            sum = sum.checked_add(count).ok_or_else(|| {
                SchemaError::InvalidCardinality(format!(
                    "category counts overflow at '{category}'"
                ))
            })?;
            resolved.push((category, count as usize));
        }

        if sum != expected_total {
            return Err(SchemaError::InvalidCardinality(format!(
                "category counts sum to {sum}, expected {expected_total}"
            )));
        }

        Ok(Self {
            counts: resolved,
            total: expected_total as usize,
        })
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Categories with their counts, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts
            .iter()
            .map(|(category, count)| (category.as_str(), *count))
    }

    pub fn count(&self, category: &str) -> Option<usize> {
        self.iter()
            .find(|(name, _)| *name == category)
            .map(|(_, count)| count)
    }

    /// JSON object `{category: count}` used when the counts are locked as a const.
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .iter()
            .map(|(category, count)| (category.to_string(), Value::from(count)))
            .collect();
        Value::Object(map)
    }
}

/// Exact-length constraint on one array, with per-category presence.
#[derive(Debug, Clone)]
pub struct ArrayLock {
    pub path: JsonPath,
    pub discriminator: String,
    pub cardinality: CardinalityLock,
    /// Categories that must appear at least once. `None` means every
    /// category with a positive count.
    pub required_present: Option<Vec<String>>,
}

impl ArrayLock {
    pub fn present_categories(&self) -> Vec<String> {
        match &self.required_present {
            Some(categories) => categories.clone(),
            None => self
                .cardinality
                .iter()
                .filter(|(_, count)| *count > 0)
                .map(|(category, _)| category.to_string())
                .collect(),
        }
    }
}

/// Everything burned into a base schema for one planning run.
#[derive(Debug, Clone, Default)]
pub struct Specialization {
    pub consts: Vec<(JsonPath, Value)>,
    pub min_items: Vec<(JsonPath, u64)>,
    pub array: Option<ArrayLock>,
}

/// Produce a specialized copy of `base`; the base tree is never mutated.
pub fn specialize(base: &SchemaNode, spec: &Specialization) -> Result<SchemaNode> {
    let mut schema = base.clone();

    for (path, value) in &spec.consts {
        schema.require_mut(path)?.const_value = Some(value.clone());
    }

    for (path, min) in &spec.min_items {
        schema.require_mut(path)?.min_items = Some(*min);
    }

    if let Some(lock) = &spec.array {
        apply_array_lock(&mut schema, lock)?;
    }

    Ok(schema)
}

fn apply_array_lock(schema: &mut SchemaNode, lock: &ArrayLock) -> Result<()> {
    let total = lock.cardinality.total() as u64;
    let array = schema.require_mut(&lock.path)?;
    let declares_discriminator = array
        .items
        .as_deref()
        .map(|items| items.properties.contains_key(&lock.discriminator))
        .ok_or_else(|| {
            SchemaError::Malformed(format!("array '{}' declares no items schema", lock.path))
        })?;
    if !declares_discriminator {
        return Err(SchemaError::UnresolvedPath(format!(
            "{}[].{}",
            lock.path, lock.discriminator
        )));
    }
    array.min_items = Some(total);
    array.max_items = Some(total);

    for category in lock.present_categories() {
        if lock.cardinality.count(&category).is_none() {
            return Err(SchemaError::InvalidCardinality(format!(
                "presence required for unknown category '{category}'"
            )));
        }
        schema
            .all_of
            .push(presence_clause(&lock.path, &lock.discriminator, &category));
    }

    Ok(())
}

/// `{"properties": {<path>: {"contains": ..., "minContains": 1}}}`, nested
/// along the array path.
fn presence_clause(path: &JsonPath, discriminator: &str, category: &str) -> SchemaNode {
    let mut matcher = SchemaNode::typed(JsonType::Object);
    matcher.properties.insert(
        discriminator.to_string(),
        SchemaNode {
            const_value: Some(Value::String(category.to_string())),
            ..SchemaNode::default()
        },
    );

    let mut clause = SchemaNode {
        contains: Some(Box::new(matcher)),
        min_contains: Some(1),
        ..SchemaNode::default()
    };
    for segment in path.segments().iter().rev() {
        let mut parent = SchemaNode::default();
        parent.properties.insert(segment.clone(), clause);
        clause = parent;
    }
    clause
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> SchemaNode {
        SchemaNode::from_json(&json!({
            "type": "object",
            "properties": {
                "constraints": {
                    "type": "object",
                    "properties": {"tone": {"type": "string"}}
                },
                "chapters": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {"act": {"type": "string"}}
                    }
                }
            }
        }))
        .expect("parse base schema")
    }

    fn path(dotted: &str) -> JsonPath {
        dotted.parse().expect("valid path")
    }

    #[test]
    fn cardinality_must_sum_to_total() {
        assert!(CardinalityLock::new([("I", 12), ("II", 9), ("III", 3)], 24).is_ok());
        assert!(matches!(
            CardinalityLock::new([("I", 12), ("II", 9)], 24),
            Err(SchemaError::InvalidCardinality(_))
        ));
        assert!(CardinalityLock::new(Vec::<(String, i64)>::new(), 0).is_err());
        assert!(CardinalityLock::new([("I", 5), ("II", -1)], 4).is_err());
        assert!(CardinalityLock::new([("I", 1), ("I", 1)], 2).is_err());
    }

    #[test]
    fn overflowing_counts_are_rejected() {
        let err = CardinalityLock::new([("I", i64::MAX), ("II", 1)], 24)
            .expect_err("overflowing counts");
        assert!(matches!(&err, SchemaError::InvalidCardinality(message) if message.contains("'II'")));
    }

    #[test]
    fn locks_consts_and_exact_length_without_touching_base() {
        let base = base();
        let lock = ArrayLock {
            path: path("chapters"),
            discriminator: "act".to_string(),
            cardinality: CardinalityLock::new([("I", 2), ("II", 0), ("III", 1)], 3)
                .expect("lock"),
            required_present: None,
        };
        let spec = Specialization {
            consts: vec![(path("constraints.tone"), json!("witty"))],
            min_items: Vec::new(),
            array: Some(lock),
        };

        let specialized = specialize(&base, &spec).expect("specialize");
        assert_eq!(
            specialized
                .resolve(&path("constraints.tone"))
                .and_then(|node| node.const_value.clone()),
            Some(json!("witty"))
        );
        let chapters = specialized.resolve(&path("chapters")).expect("chapters");
        assert_eq!(chapters.min_items, Some(3));
        assert_eq!(chapters.max_items, Some(3));

        // Zero-count categories are not required to be present.
        assert_eq!(specialized.all_of.len(), 2);
        assert_eq!(
            specialized.all_of[1].to_json(),
            json!({"properties": {"chapters": {
                "contains": {"type": "object", "properties": {"act": {"const": "III"}}},
                "minContains": 1
            }}})
        );

        assert_eq!(base.all_of.len(), 0);
        assert!(base.resolve(&path("constraints.tone")).and_then(|n| n.const_value.clone()).is_none());
    }

    #[test]
    fn unresolved_paths_fail() {
        let spec = Specialization {
            consts: vec![(path("constraints.missing"), json!(1))],
            ..Specialization::default()
        };
        assert!(matches!(
            specialize(&base(), &spec),
            Err(SchemaError::UnresolvedPath(_))
        ));

        let spec = Specialization {
            array: Some(ArrayLock {
                path: path("chapters"),
                discriminator: "part".to_string(),
                cardinality: CardinalityLock::new([("I", 1)], 1).expect("lock"),
                required_present: None,
            }),
            ..Specialization::default()
        };
        assert!(specialize(&base(), &spec).is_err());
    }
}
