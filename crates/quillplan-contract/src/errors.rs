use quillplan_core::SchemaError;
use thiserror::Error;

/// Errors raised while assembling a book-plan contract.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("schema compilation failed: {0}")]
    Compile(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("unsatisfiable pacing: {0}")]
    UnsatisfiablePacing(String),
}

/// Result type for contract operations.
pub type Result<T> = std::result::Result<T, ContractError>;
