use quillplan_core::{CategoryRule, set_path, take_path};
use serde_json::{Map, Value};

use crate::model::EnforcementReport;

/// Rebuild the category-tagged array with exactly the locked count per
/// category, in canonical category order, numbered 1..N.
///
/// Non-object entries are dropped and entries with an unknown discriminator
/// join the first category. Over-full categories keep their first entries;
/// short ones are padded with the category placeholder.
pub(crate) fn backfill_categories(
    document: &mut Value,
    rule: &CategoryRule,
    entry_template: &Map<String, Value>,
    report: &mut EnforcementReport,
) {
    let Some(default_category) = rule.categories.first() else {
        return;
    };

    let entries = match take_path(document, &rule.array_path) {
        Some(Value::Array(entries)) => entries,
        _ => Vec::new(),
    };

    let mut buckets: Vec<Vec<Map<String, Value>>> = vec![Vec::new(); rule.categories.len()];
    for entry in entries {
        let Value::Object(mut entry) = entry else {
            report.record_dropped();
            continue;
        };
        let position = entry
            .get(&rule.discriminator)
            .and_then(Value::as_str)
            .and_then(|name| rule.position(name));
        let position = match position {
            Some(position) => position,
            None => {
                entry.insert(
                    rule.discriminator.clone(),
                    Value::String(default_category.name.clone()),
                );
                report.record_reassigned();
                0
            }
        };
        if complete_entry(&mut entry, entry_template) {
            report.record_completed();
        }
        buckets[position].push(entry);
    }

    for (category, bucket) in rule.categories.iter().zip(buckets.iter_mut()) {
        if bucket.len() > category.count {
            let removed = bucket.len() - category.count;
            bucket.truncate(category.count);
            report.record_truncation(&category.name, removed as u64);
        }
        while bucket.len() < category.count {
            let mut entry = match &category.placeholder {
                Value::Object(placeholder) => placeholder.clone(),
                _ => Map::new(),
            };
            entry.insert(
                rule.discriminator.clone(),
                Value::String(category.name.clone()),
            );
            complete_entry(&mut entry, entry_template);
            bucket.push(entry);
            report.record_backfill(&category.name);
        }
    }

    let rebuilt: Vec<Value> = buckets
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(idx, mut entry)| {
            entry.insert(rule.sequence_field.clone(), Value::from(idx + 1));
            Value::Object(entry)
        })
        .collect();

    set_path(document, &rule.array_path, Value::Array(rebuilt));
}

/// Insert template values for missing keys. Returns whether anything was added.
fn complete_entry(entry: &mut Map<String, Value>, template: &Map<String, Value>) -> bool {
    let mut completed = false;
    for (key, value) in template {
        if !entry.contains_key(key) {
            entry.insert(key.clone(), value.clone());
            completed = true;
        }
    }
    completed
}
