//! Deterministic repair pipeline run on every candidate document.
//!
//! Stages run in a fixed order: unknown-key stripping, lock re-assertion,
//! category backfill, budget rebalancing, selection backfill, and a final
//! re-lock and strip. The pipeline never fails; anything it cannot coerce is
//! left for schema validation to reject.

mod budget;
mod categories;
mod locks;
mod selection;
mod strip;

use quillplan_core::{EnforcementContext, SchemaNode, derive_skeleton};
use serde_json::{Map, Value};
use tracing::debug;

use crate::model::EnforcementReport;

pub use budget::rebalance;

/// Applies one run's [`EnforcementContext`] to candidate documents.
#[derive(Debug, Clone)]
pub struct ConstraintEnforcer {
    schema: SchemaNode,
    context: EnforcementContext,
    entry_template: Map<String, Value>,
}

impl ConstraintEnforcer {
    pub fn new(schema: SchemaNode, context: EnforcementContext) -> Self {
        let entry_template = context
            .categories
            .as_ref()
            .and_then(|rule| schema.resolve(&rule.array_path))
            .and_then(|array| array.items.as_deref())
            .map(derive_skeleton)
            .and_then(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default();

        Self {
            schema,
            context,
            entry_template,
        }
    }

    pub fn schema(&self) -> &SchemaNode {
        &self.schema
    }

    pub fn context(&self) -> &EnforcementContext {
        &self.context
    }

    /// Run the full pipeline. Running it again on its own output changes nothing.
    pub fn enforce(&self, candidate: Value) -> (Value, EnforcementReport) {
        let mut report = EnforcementReport::default();
        let mut document = if candidate.is_object() {
            candidate
        } else {
            report.record_replaced_root();
            Value::Object(Map::new())
        };

        strip::strip_unknown(&mut document, &self.schema, &mut report);
        locks::reassert_locks(&mut document, &self.context.locks, &mut report);

        if let Some(rule) = &self.context.categories {
            categories::backfill_categories(&mut document, rule, &self.entry_template, &mut report);
            budget::rebalance_budgets(&mut document, rule, &mut report);
        }

        for rule in &self.context.selections {
            selection::backfill_selection(&mut document, rule, &mut report);
        }

        locks::reassert_locks(&mut document, &self.context.locks, &mut report);
        strip::strip_unknown(&mut document, &self.schema, &mut report);

        debug!(
            repairs = report.repairs(),
            stripped = report.stripped_keys.len(),
            relocked = report.relocked_paths.len(),
            backfilled = report.backfilled.values().sum::<u64>(),
            rebalanced = report.rebalanced.len(),
            "enforcement pass finished"
        );

        (document, report)
    }
}
