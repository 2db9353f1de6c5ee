use std::time::Duration;

use quillplan_contract::{
    BookPlan, JsonSchemaValidator, PacingProfile, PlanRequest, PreparedRun, prepare_run,
};
use quillplan_core::{
    AcceptAll, DocumentValidator, GenerationClient, ValidationIssue, ValidationReport, render_skeleton,
};
use serde_json::Value;
use tracing::info;

use crate::enforce::ConstraintEnforcer;
use crate::errors::PlanningError;
use crate::model::{AttemptRecord, EnforcementReport, RetryPolicy};
use crate::parser::extract_json_object;
use crate::retry::RetryOrchestrator;

/// Default per-call generation timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Options for a planning run.
#[derive(Debug, Clone)]
pub struct PlannerOptions {
    pub pacing: PacingProfile,
    pub retry: RetryPolicy,
    /// Passed to the generation client on every call.
    pub timeout: Duration,
    /// Validate enforced documents against the specialized schema.
    pub validate: bool,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            pacing: PacingProfile::default(),
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
            validate: true,
        }
    }
}

/// Accepts a document only when it passes the schema check (if enabled) and
/// decodes as a [`BookPlan`].
struct PlanValidator {
    schema: Box<dyn DocumentValidator>,
}

impl PlanValidator {
    fn new(prepared: &PreparedRun, validate: bool) -> Result<Self, PlanningError> {
        let schema: Box<dyn DocumentValidator> = if validate {
            Box::new(JsonSchemaValidator::compile(&prepared.schema)?)
        } else {
            Box::new(AcceptAll)
        };
        Ok(Self { schema })
    }
}

impl DocumentValidator for PlanValidator {
    fn validate(&self, document: &Value) -> ValidationReport {
        let mut report = self.schema.validate(document);
        if report.is_ok()
            && let Err(err) = serde_json::from_value::<BookPlan>(document.clone())
        {
            report.push(ValidationIssue::decode("/", err.to_string()));
        }
        report
    }
}

/// Accepted plan of one run.
#[derive(Debug, Clone)]
pub struct PlannedBook {
    pub plan: BookPlan,
    pub document: Value,
    pub attempts: u32,
    pub history: Vec<AttemptRecord>,
    pub report: EnforcementReport,
}

/// Plan a book from a request: prepare the contract, then generate until a
/// document is accepted.
pub fn plan_book(
    request: &PlanRequest,
    client: &dyn GenerationClient,
    options: &PlannerOptions,
) -> Result<PlannedBook, PlanningError> {
    let prepared = prepare_run(request, &options.pacing)?;
    plan_prepared(&prepared, client, options)
}

/// Generate against an already prepared run.
pub fn plan_prepared(
    prepared: &PreparedRun,
    client: &dyn GenerationClient,
    options: &PlannerOptions,
) -> Result<PlannedBook, PlanningError> {
    let enforcer = ConstraintEnforcer::new(prepared.schema.clone(), prepared.context.clone());
    let validator = PlanValidator::new(prepared, options.validate)?;
    let skeleton = render_skeleton(&prepared.skeleton);

    info!(
        chapters = prepared.chapter_lock.total(),
        max_attempts = options.retry.max_attempts(),
        timeout_secs = options.timeout.as_secs(),
        validate = options.validate,
        "planning started"
    );

    let orchestrator = RetryOrchestrator::new(
        client,
        &enforcer,
        &validator,
        options.retry.clone(),
        options.timeout,
    );
    let accepted = orchestrator.run(&prepared.messages, &skeleton)?;
    let plan: BookPlan = serde_json::from_value(accepted.document.clone())?;

    info!(
        attempts = accepted.attempts,
        chapters = plan.chapter_plan.len(),
        "planning finished"
    );

    Ok(PlannedBook {
        plan,
        document: accepted.document,
        attempts: accepted.attempts,
        history: accepted.history,
        report: accepted.report,
    })
}

/// Result of enforcing a saved generator response.
#[derive(Debug, Clone)]
pub struct OfflineEnforcement {
    pub document: Value,
    pub report: EnforcementReport,
    pub validation: ValidationReport,
}

/// Parse, enforce and validate a saved raw generator response without
/// calling a generator. The typed decode runs even when `validate` is off.
pub fn enforce_raw(
    prepared: &PreparedRun,
    raw: &str,
    validate: bool,
) -> Result<OfflineEnforcement, PlanningError> {
    let candidate = extract_json_object(raw)?;
    let enforcer = ConstraintEnforcer::new(prepared.schema.clone(), prepared.context.clone());
    let (document, report) = enforcer.enforce(candidate);
    let validation = PlanValidator::new(prepared, validate)?.validate(&document);
    Ok(OfflineEnforcement {
        document,
        report,
        validation,
    })
}
