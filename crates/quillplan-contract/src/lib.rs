//! Book-plan contract for quillplan.
//!
//! This crate owns the static book-plan schema template, the pacing math and
//! everything `prepare_run` derives from a request: the specialized schema,
//! the seeded skeleton, the enforcement context and the prompt. It also
//! provides the JSON Schema validator used to accept final documents.

pub mod errors;
pub mod model;
pub mod pacing;
pub mod prompt;
pub mod run;
pub mod schema;
pub mod seed;
pub mod selection;
pub mod validate;

pub use errors::{ContractError, Result};
pub use model::{
    ActPacing, BookPlan, Canon, ChapterEntry, DEFAULT_MAX_TOTAL_WORDS, Locale, MythicFigure,
    Pacing, PacingProfile, PlanConstraints, PlanRequest, PointOfView, ResearchSelection,
};
pub use pacing::{chapter_lock, check_profile, compute_word_targets, targets_value};
pub use prompt::build_prompt;
pub use run::{PreparedRun, prepare_run, tone_and_pace};
pub use schema::{
    ACT_FIELD, CHAPTER_PLAN, SEQUENCE_FIELD, WORD_COUNT_FIELD, WORD_COUNT_FLOOR,
    base_book_plan_schema, book_plan_json_schema, request_json_schema,
};
pub use seed::{build_chapter_seed, chapter_seed_overlay, placeholder_chapter};
pub use selection::{MIN_SELECTION_ITEMS, preferred_figures, research_selection_rules};
pub use validate::{JsonSchemaValidator, validate_document_json};
