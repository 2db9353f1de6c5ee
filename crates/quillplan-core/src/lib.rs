//! Core contracts and helpers for quillplan.
//!
//! This crate defines the schema model, the pure schema transformations
//! (specialization, skeleton derivation, seeding), the enforcement context
//! and the boundary traits shared by the contract, engine and adapters.

pub mod context;
pub mod error;
pub mod generation;
pub mod path;
pub mod schema;
pub mod seed;
pub mod skeleton;
pub mod specialize;
pub mod validation;

pub use context::{CategoryRule, CategoryTarget, EnforcementContext, LockedValue, SelectionRule};
pub use error::{Result, SchemaError};
pub use generation::{ChatMessage, GenerationClient, Role, TransportError};
pub use path::{JsonPath, get_path, get_path_mut, set_path, take_path};
pub use schema::{JsonType, SchemaNode, TypeSpec};
pub use seed::{SeedOverlay, inject_seed};
pub use skeleton::{derive_skeleton, render_skeleton};
pub use specialize::{ArrayLock, CardinalityLock, Specialization, specialize};
pub use validation::{
    AcceptAll, DocumentValidator, IssueKind, ValidationIssue, ValidationReport,
};
