use thiserror::Error;

/// Errors raised while building or specializing a schema contract.
///
/// These are fatal for a planning run: no amount of retrying the generator
/// can repair a contract that cannot be satisfied.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A dotted path does not resolve to a node of the schema.
    #[error("unresolved schema path: {0}")]
    UnresolvedPath(String),
    /// A dotted path is syntactically invalid.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
    /// Cardinality targets are inconsistent or non-positive.
    #[error("invalid cardinality: {0}")]
    InvalidCardinality(String),
    /// The schema template itself cannot be read.
    #[error("malformed schema: {0}")]
    Malformed(String),
}

/// Convenience alias for results returned by quillplan crates.
pub type Result<T> = std::result::Result<T, SchemaError>;
