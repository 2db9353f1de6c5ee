use serde_json::Value;

use crate::path::JsonPath;

/// Canonical value re-asserted at a document path on every enforcement pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LockedValue {
    pub path: JsonPath,
    pub value: Value,
}

impl LockedValue {
    pub fn new(path: JsonPath, value: Value) -> Self {
        Self { path, value }
    }
}

/// Required size, numeric budget and backfill template of one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTarget {
    pub name: String,
    pub count: usize,
    /// Target sum of the budget field across the category; `None` skips rebalancing.
    pub budget: Option<i64>,
    /// Entry synthesized when the category is short of `count`.
    pub placeholder: Value,
}

/// Layout of the designated, category-tagged array.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRule {
    pub array_path: JsonPath,
    pub discriminator: String,
    pub sequence_field: String,
    pub budget_field: String,
    /// Hard lower bound for any entry's budget field.
    pub budget_floor: i64,
    /// Canonical order; the first category is the default bucket.
    pub categories: Vec<CategoryTarget>,
}

impl CategoryRule {
    pub fn total(&self) -> usize {
        self.categories.iter().map(|category| category.count).sum()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.categories
            .iter()
            .position(|category| category.name == name)
    }
}

/// Named list that must hold exactly `min_items` distinct names.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRule {
    pub path: JsonPath,
    pub min_items: usize,
    /// Optional string fields carried over from existing entries.
    pub fields: Vec<String>,
    /// Canonical names appended, in order, when the list is short.
    pub fallback: Vec<String>,
}

/// Single source of truth for one planning run's repairs. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnforcementContext {
    pub locks: Vec<LockedValue>,
    pub categories: Option<CategoryRule>,
    pub selections: Vec<SelectionRule>,
}
