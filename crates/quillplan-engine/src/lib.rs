//! Structured-output enforcement engine for quillplan.
//!
//! Turns free-form generator output into a schema-valid book plan: the
//! response parser isolates the JSON object, the constraint enforcer repairs
//! it deterministically, and the retry orchestrator validates the result and
//! retries the generator within a fixed attempt budget.

pub mod enforce;
pub mod errors;
pub mod model;
pub mod parser;
pub mod planner;
pub mod retry;

pub use enforce::{ConstraintEnforcer, rebalance};
pub use errors::{AttemptError, ParseError, PlanningError};
pub use model::{AcceptedDocument, AttemptRecord, EnforcementReport, RetryPolicy};
pub use parser::extract_json_object;
pub use planner::{
    DEFAULT_TIMEOUT, OfflineEnforcement, PlannedBook, PlannerOptions, enforce_raw, plan_book,
    plan_prepared,
};
pub use retry::{AttemptPhase, RetryOrchestrator};
