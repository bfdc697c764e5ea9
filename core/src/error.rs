//! Error types
//!
//! Every failure surfaces synchronously at the call that caused it. Missing actions and
//! unknown workflow names are deliberately absent from this module: neither is an error.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to parse or evaluate a rule expression.
///
/// Carries the expression text alongside the underlying cause so callers can report
/// which rule broke without holding on to the rule itself.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to evaluate expression `{expression}`: {kind}")]
pub struct ExpressionError {
    pub expression: String,
    pub kind: ExpressionErrorKind,
}

impl ExpressionError {
    pub fn new(expression: impl Into<String>, kind: ExpressionErrorKind) -> Self {
        Self {
            expression: expression.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionErrorKind {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),
    #[error("member '{0}' not found")]
    MissingMember(String),
    #[error("index {index} out of bounds (length {len})")]
    IndexOutOfBounds { index: i64, len: usize },
    #[error("type error: {0}")]
    Type(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("function '{name}' expects {expected} argument(s), got {actual}")]
    Arity {
        name: String,
        expected: String,
        actual: usize,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("numeric overflow")]
    Overflow,
    #[error("expression produced {0}, expected a boolean")]
    NotBoolean(String),
    #[error("failed to convert input: {0}")]
    InputConversion(String),
}

/// An action name was registered twice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("action '{name}' is already registered")]
pub struct DuplicateActionError {
    pub name: String,
}

/// Two workflows in one set share a name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("workflow '{name}' is defined more than once")]
pub struct DuplicateWorkflowNameError {
    pub name: String,
}

/// A workflow definition that cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("workflow name must not be empty")]
    EmptyWorkflowName,
    #[error("workflow '{workflow}' has a rule with an empty name (position {position})")]
    EmptyRuleName { workflow: String, position: usize },
    #[error("rule '{rule}' in workflow '{workflow}' has an empty expression")]
    EmptyExpression { workflow: String, rule: String },
    #[error("rule '{rule}' appears more than once in workflow '{workflow}'")]
    DuplicateRuleName { workflow: String, rule: String },
}

/// Failure to load workflow definitions from a file.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON workflow definitions: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid TOML workflow definitions: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported definition format '{0}' (expected .json or .toml)")]
    UnsupportedFormat(String),
    #[error(transparent)]
    DuplicateWorkflowName(#[from] DuplicateWorkflowNameError),
}

/// Failure of an evaluation over an ad hoc workflow set, which can also be rejected up front.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Expression(#[from] ExpressionError),
    #[error(transparent)]
    DuplicateWorkflowName(#[from] DuplicateWorkflowNameError),
}
