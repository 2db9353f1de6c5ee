use quillplan_core::{JsonPath, JsonType, SchemaNode, SelectionRule};
use serde_json::Value;

use crate::errors::Result;

/// Minimum number of distinct entries in each research-selection list.
pub const MIN_SELECTION_ITEMS: usize = 3;

const KNOWN_FIGURES: [&str; 4] = ["Baba Yaga", "Leshy", "Domovoi", "Rusalka"];
const DEFAULT_FIGURES: [&str; 3] = ["Baba Yaga", "Leshy", "Domovoi"];
const DEFAULT_LOCALES: [&str; 3] = ["Meadow", "Forest Edge", "Enchanted Forest"];

/// Figures from the known set that the idea or summary mentions, followed by
/// the default trio, without repeats.
pub fn preferred_figures(book_model: &Value, summary_text: &str) -> Vec<String> {
    let idea = book_model
        .pointer("/book/idea")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let haystack = format!("{idea}\n{summary_text}").to_lowercase();

    let mut figures: Vec<String> = KNOWN_FIGURES
        .iter()
        .filter(|name| haystack.contains(&name.to_lowercase()))
        .map(|name| name.to_string())
        .collect();
    for name in DEFAULT_FIGURES {
        if !figures.iter().any(|figure| figure == name) {
            figures.push(name.to_string());
        }
    }
    figures
}

/// Selection rules for `research_selection.mythic_figures` and `.locales`.
///
/// Kept optional fields are the item schema's string properties besides `name`.
pub fn research_selection_rules(
    schema: &SchemaNode,
    book_model: &Value,
    summary_text: &str,
) -> Result<Vec<SelectionRule>> {
    let figures: JsonPath = "research_selection.mythic_figures".parse()?;
    let locales: JsonPath = "research_selection.locales".parse()?;

    Ok(vec![
        SelectionRule {
            fields: optional_string_fields(schema, &figures),
            path: figures,
            min_items: MIN_SELECTION_ITEMS,
            fallback: preferred_figures(book_model, summary_text),
        },
        SelectionRule {
            fields: optional_string_fields(schema, &locales),
            path: locales,
            min_items: MIN_SELECTION_ITEMS,
            fallback: DEFAULT_LOCALES.iter().map(|name| name.to_string()).collect(),
        },
    ])
}

fn optional_string_fields(schema: &SchemaNode, path: &JsonPath) -> Vec<String> {
    schema
        .resolve(path)
        .and_then(|node| node.items.as_deref())
        .map(|items| {
            items
                .properties
                .iter()
                .filter(|(name, node)| {
                    name.as_str() != "name"
                        && node.effective_type() == Some(JsonType::String)
                })
                .map(|(name, _)| name.clone())
                .collect()
        })
        .unwrap_or_default()
}
