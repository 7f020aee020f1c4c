//! Error types for the stack engine.

use thiserror::Error;

use bf_lookup::LookupError;
use bf_rules::RuleError;

/// Result type alias for stack operations.
pub type StackResult<T> = Result<T, StackError>;

/// Errors that can occur while loading, validating or rendering a stack.
#[derive(Error, Debug)]
pub enum StackError {
    #[error("Configuration source unavailable: {path}: {source}")]
    SourceUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed configuration: {0}")]
    MalformedConfig(String),

    #[error("Stack kind is required")]
    MissingKind,

    #[error("Unknown stack kind '{kind}' (registered: {registered})")]
    UnknownKind { kind: String, registered: String },

    #[error("Schema mismatch at {path}: expected {expected}")]
    SchemaMismatch { path: String, expected: String },

    #[error("Validation failed at {path}: {message}")]
    Validation {
        path: String,
        rule: String,
        message: String,
    },

    #[error("Subnet lookup failed for tag '{tag}' in {scope}: {message}")]
    LookupFailure {
        tag: String,
        scope: String,
        message: String,
        #[source]
        source: Option<LookupError>,
    },

    #[error("Render failed: {0}")]
    Render(String),
}

impl StackError {
    pub fn validation(
        path: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation {
            path: path.into(),
            rule: rule.into(),
            message: message.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Wrap an error returned by the lookup service.
    pub fn lookup(tag: impl Into<String>, scope: impl Into<String>, source: LookupError) -> Self {
        Self::LookupFailure {
            tag: tag.into(),
            scope: scope.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// A lookup that succeeded but matched nothing.
    pub fn no_matches(tag: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::LookupFailure {
            tag: tag.into(),
            scope: scope.into(),
            message: "no matching subnets".to_string(),
            source: None,
        }
    }

    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            StackError::SourceUnavailable { .. } => 3,
            StackError::MalformedConfig(_) => 4,
            StackError::MissingKind => 5,
            StackError::UnknownKind { .. } => 6,
            StackError::SchemaMismatch { .. } => 7,
            StackError::Validation { .. } => 8,
            StackError::LookupFailure { .. } => 9,
            StackError::Render(_) => 10,
        }
    }
}

impl From<RuleError> for StackError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::FieldViolation { path, rule } => {
                let message = if rule == "required" {
                    "value is required".to_string()
                } else {
                    format!("failed rule '{}'", rule)
                };
                StackError::Validation {
                    path,
                    rule,
                    message,
                }
            }
            RuleError::SchemaMismatch { path, expected } => {
                StackError::SchemaMismatch { path, expected }
            }
            RuleError::UnknownRule(rule) => StackError::Validation {
                path: String::new(),
                message: format!("unknown validation rule '{}'", rule),
                rule,
            },
        }
    }
}
