mod logging;
mod run;

pub use logging::{init_run_logging, init_stderr_logging};
pub use run::{RunContext, RunDir, RunReport, RunStatus, start_run};

use thiserror::Error;

use crate::output::OutputError;

/// Registry-level errors for run artifacts.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("artifact error: {0}")]
    Output(#[from] OutputError),
    #[error("logging error: {0}")]
    Logging(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
