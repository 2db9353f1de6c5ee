use quillplan_core::SchemaNode;
use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::errors::Result;
use crate::model::{BookPlan, PlanRequest};

const BASE_SCHEMA: &str = include_str!("../schemas/book_plan.schema.json");

/// Designated category-tagged array of the plan.
pub const CHAPTER_PLAN: &str = "chapter_plan";
/// Discriminator field of chapter entries.
pub const ACT_FIELD: &str = "act";
/// Sequence field renumbered 1..N across the chapter plan.
pub const SEQUENCE_FIELD: &str = "ch";
/// Numeric budget field rebalanced per act.
pub const WORD_COUNT_FIELD: &str = "word_count";
/// Lowest word count any chapter may carry.
pub const WORD_COUNT_FLOOR: i64 = 300;
/// Initial word count of seeded chapters.
pub const SEED_WORD_COUNT: i64 = 1800;

/// Parse the static book-plan schema template.
pub fn base_book_plan_schema() -> Result<SchemaNode> {
    Ok(SchemaNode::from_json_str(BASE_SCHEMA)?)
}

/// Emit the JSON Schema for request files.
pub fn request_json_schema() -> RootSchema {
    schema_for!(PlanRequest)
}

/// Emit the JSON Schema of the typed plan.
pub fn book_plan_json_schema() -> RootSchema {
    schema_for!(BookPlan)
}
