use quillplan_contract::ContractError;
use quillplan_core::{TransportError, ValidationReport};
use thiserror::Error;

use crate::model::AttemptRecord;

/// Raw generator text that holds no usable JSON object.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in response: {preview:?}")]
    NoObject { preview: String },
    #[error("malformed JSON object: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Retryable failure of a single attempt.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("validation failed: {}", .0.summary(3))]
    Validation(ValidationReport),
}

impl AttemptError {
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptError::Transport(_) => "transport",
            AttemptError::Parse(_) => "parse",
            AttemptError::Validation(_) => "validation",
        }
    }
}

/// Terminal errors of a planning run.
#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("contract error: {0}")]
    Contract(#[from] ContractError),
    #[error("retries exhausted after {attempts} attempt(s): {last}")]
    RetryExhausted {
        attempts: u32,
        last: AttemptError,
        history: Vec<AttemptRecord>,
    },
    #[error("unusable generator response: {0}")]
    Parse(#[from] ParseError),
    #[error("accepted document does not decode as a book plan: {0}")]
    Decode(#[from] serde_json::Error),
}
