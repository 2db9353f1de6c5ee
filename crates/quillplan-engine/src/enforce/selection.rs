use std::collections::BTreeSet;

use quillplan_core::{SelectionRule, get_path, set_path};
use serde_json::{Map, Value};

use crate::model::EnforcementReport;

/// Normalize a named list to `{name, ...fields}` entries with distinct names,
/// topped up from the fallback names and cut to exactly `min_items`.
pub(crate) fn backfill_selection(document: &mut Value, rule: &SelectionRule, report: &mut EnforcementReport) {
    let existing = get_path(document, &rule.path)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut seen = BTreeSet::new();
    let mut selected: Vec<Value> = Vec::new();
    for item in &existing {
        let Some(entry) = normalize_entry(item, &rule.fields) else {
            continue;
        };
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if seen.insert(name) {
            selected.push(Value::Object(entry));
        }
    }

    let mut appended = 0_u64;
    for name in &rule.fallback {
        if selected.len() >= rule.min_items {
            break;
        }
        if seen.insert(name.clone()) {
            let mut entry = Map::new();
            entry.insert("name".to_string(), Value::String(name.clone()));
            selected.push(Value::Object(entry));
            appended += 1;
        }
    }
    selected.truncate(rule.min_items);

    let rebuilt = Value::Array(selected);
    if get_path(document, &rule.path) != Some(&rebuilt) {
        set_path(document, &rule.path, rebuilt);
        report.record_selection_fill(&rule.path.to_string(), appended);
    }
}

fn normalize_entry(item: &Value, fields: &[String]) -> Option<Map<String, Value>> {
    let mut entry = Map::new();
    match item {
        Value::String(name) => {
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            entry.insert("name".to_string(), Value::String(name.to_string()));
        }
        Value::Object(object) => {
            let name = object.get("name").and_then(Value::as_str)?.trim();
            if name.is_empty() {
                return None;
            }
            entry.insert("name".to_string(), Value::String(name.to_string()));
            for field in fields {
                if let Some(Value::String(text)) = object.get(field) {
                    entry.insert(field.clone(), Value::String(text.clone()));
                }
            }
        }
        _ => return None,
    }
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule() -> SelectionRule {
        SelectionRule {
            path: "research_selection.locales".parse().expect("path"),
            min_items: 3,
            fields: vec!["function".to_string()],
            fallback: vec![
                "Meadow".to_string(),
                "Forest Edge".to_string(),
                "Enchanted Forest".to_string(),
            ],
        }
    }

    #[test]
    fn promotes_dedups_and_fills() {
        let mut document = json!({"research_selection": {"locales": [
            "Meadow",
            {"name": "Meadow", "function": "duplicate"},
            {"name": "Stone Ford", "function": "crossing", "rank": 3},
            {"function": "nameless"},
            42
        ]}});
        let mut report = EnforcementReport::default();
        backfill_selection(&mut document, &rule(), &mut report);

        assert_eq!(
            document["research_selection"]["locales"],
            json!([
                {"name": "Meadow"},
                {"name": "Stone Ford", "function": "crossing"},
                {"name": "Forest Edge"}
            ])
        );
        assert_eq!(
            report.selection_fills.get("research_selection.locales"),
            Some(&1)
        );
    }

    #[test]
    fn long_lists_are_cut_to_exact_size() {
        let mut document = json!({"research_selection": {"locales": ["a", "b", "c", "d"]}});
        let mut report = EnforcementReport::default();
        backfill_selection(&mut document, &rule(), &mut report);

        let names: Vec<&str> = document["research_selection"]["locales"]
            .as_array()
            .expect("locales")
            .iter()
            .filter_map(|entry| entry["name"].as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn conforming_list_is_untouched() {
        let mut document = json!({"research_selection": {"locales": [
            {"name": "a"}, {"name": "b", "function": "x"}, {"name": "c"}
        ]}});
        let before = document.clone();
        let mut report = EnforcementReport::default();
        backfill_selection(&mut document, &rule(), &mut report);
        assert_eq!(document, before);
        assert!(report.is_clean());
    }
}
