use std::fmt;
use std::thread;
use std::time::Duration;

use quillplan_core::{ChatMessage, DocumentValidator, GenerationClient};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::enforce::ConstraintEnforcer;
use crate::errors::{AttemptError, PlanningError};
use crate::model::{AcceptedDocument, AttemptRecord, EnforcementReport, RetryPolicy};
use crate::parser::extract_json_object;

/// Phase of the attempt loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    Generating,
    Parsing,
    Enforcing,
    Validating,
    Accepted,
    Retrying,
    Failed,
}

impl fmt::Display for AttemptPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generating => write!(f, "generating"),
            Self::Parsing => write!(f, "parsing"),
            Self::Enforcing => write!(f, "enforcing"),
            Self::Validating => write!(f, "validating"),
            Self::Accepted => write!(f, "accepted"),
            Self::Retrying => write!(f, "retrying"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

enum Step {
    Generating,
    Parsing(String),
    Enforcing(Value),
    Validating(Value, EnforcementReport),
    Accepted(Value, EnforcementReport),
    Retrying,
    Failed(AttemptError),
}

impl Step {
    fn phase(&self) -> AttemptPhase {
        match self {
            Step::Generating => AttemptPhase::Generating,
            Step::Parsing(_) => AttemptPhase::Parsing,
            Step::Enforcing(_) => AttemptPhase::Enforcing,
            Step::Validating(..) => AttemptPhase::Validating,
            Step::Accepted(..) => AttemptPhase::Accepted,
            Step::Retrying => AttemptPhase::Retrying,
            Step::Failed(_) => AttemptPhase::Failed,
        }
    }
}

/// Drives generate, parse, enforce and validate until a document is
/// accepted or the attempt budget runs out.
pub struct RetryOrchestrator<'a> {
    client: &'a dyn GenerationClient,
    enforcer: &'a ConstraintEnforcer,
    validator: &'a dyn DocumentValidator,
    policy: RetryPolicy,
    timeout: Duration,
}

impl<'a> RetryOrchestrator<'a> {
    pub fn new(
        client: &'a dyn GenerationClient,
        enforcer: &'a ConstraintEnforcer,
        validator: &'a dyn DocumentValidator,
        policy: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            enforcer,
            validator,
            policy,
            timeout,
        }
    }

    pub fn run(&self, messages: &[ChatMessage], skeleton: &str) -> Result<AcceptedDocument, PlanningError> {
        let mut attempt = 1_u32;
        let mut history: Vec<AttemptRecord> = Vec::new();
        let mut step = Step::Generating;

        loop {
            debug!(attempt, phase = %step.phase(), "attempt phase");
            step = match step {
                Step::Generating => {
                    info!(
                        attempt,
                        max_attempts = self.policy.max_attempts(),
                        client = self.client.name(),
                        "generation attempt started"
                    );
                    match self
                        .client
                        .generate(messages, self.enforcer.schema(), skeleton, self.timeout)
                    {
                        Ok(raw) => Step::Parsing(raw),
                        Err(err) => self.fail(attempt, err.into(), &mut history),
                    }
                }
                Step::Parsing(raw) => match extract_json_object(&raw) {
                    Ok(candidate) => Step::Enforcing(candidate),
                    Err(err) => self.fail(attempt, err.into(), &mut history),
                },
                Step::Enforcing(candidate) => {
                    let (document, report) = self.enforcer.enforce(candidate);
                    Step::Validating(document, report)
                }
                Step::Validating(document, report) => {
                    let validation = self.validator.validate(&document);
                    if validation.is_ok() {
                        Step::Accepted(document, report)
                    } else {
                        self.fail(attempt, AttemptError::Validation(validation), &mut history)
                    }
                }
                Step::Accepted(document, report) => {
                    info!(
                        attempt,
                        repairs = report.repairs(),
                        "document accepted"
                    );
                    return Ok(AcceptedDocument {
                        document,
                        attempts: attempt,
                        history,
                        report,
                    });
                }
                Step::Retrying => {
                    thread::sleep(self.policy.delay());
                    attempt += 1;
                    Step::Generating
                }
                Step::Failed(last) => {
                    warn!(attempts = attempt, error = %last, "retries exhausted");
                    return Err(PlanningError::RetryExhausted {
                        attempts: attempt,
                        last,
                        history,
                    });
                }
            };
        }
    }

    fn fail(&self, attempt: u32, error: AttemptError, history: &mut Vec<AttemptRecord>) -> Step {
        warn!(attempt, kind = error.kind(), error = %error, "attempt failed");
        history.push(AttemptRecord {
            attempt,
            kind: error.kind().to_string(),
            error: error.to_string(),
        });
        if attempt < self.policy.max_attempts() {
            Step::Retrying
        } else {
            Step::Failed(error)
        }
    }
}
