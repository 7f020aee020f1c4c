//! Error types for rule evaluation.

use thiserror::Error;

/// Result type alias for rule operations.
pub type RuleResult<T> = Result<T, RuleError>;

/// Errors raised while checking constraints.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Unknown validation rule: {0}")]
    UnknownRule(String),

    #[error("{path}: failed rule '{rule}'")]
    FieldViolation { path: String, rule: String },

    #[error("{path}: expected {expected}")]
    SchemaMismatch { path: String, expected: String },
}
