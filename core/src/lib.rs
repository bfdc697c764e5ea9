pub mod actions;
pub mod cli;
pub mod config;
pub mod definitions;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod logging;
pub mod rule;
pub mod workflow;

// Re-export main types
pub use actions::{action_name, Action, ActionRegistry};
pub use crate::config::Config;
pub use definitions::{load_workflow_file, LoadedWorkflows, WorkflowSet};
pub use engine::{Engine, InvalidRule};
pub use error::{
    DefinitionError, DuplicateActionError, DuplicateWorkflowNameError, Error, ExpressionError, ExpressionErrorKind,
    WorkflowError,
};
pub use evaluator::{RuleResults, WorkflowResults};
pub use expression::{ExpressionEvaluator, Interpreter};
pub use rule::{Context, Rule};
pub use workflow::Workflow;
