//! Engine facade
//!
//! Owns the registered workflows and the action registry, and exposes the evaluate /
//! evaluate-all operations. Registration needs `&mut Engine` while evaluation only needs
//! `&Engine`, so actions are always registered before any evaluation can start.
//!
//! ```
//! use ruleflow_core::{Engine, Rule, Workflow};
//! use serde_json::json;
//!
//! let workflow = Workflow::new("numbers", vec![Rule::new("checkNumber", "input.SomeNumber == 1")])?;
//! let engine = Engine::new(vec![workflow])?;
//!
//! let results = engine.evaluate_named(&mut json!({ "SomeNumber": 1 }), "numbers")?;
//! assert_eq!(results.get("checkNumber"), Some(&true));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[cfg(test)]
mod test_actions;

use indexmap::IndexMap;
use tracing::{debug, instrument};

use crate::actions::{action_name, Action, ActionRegistry};
use crate::config::Config;
use crate::error::{DuplicateActionError, DuplicateWorkflowNameError, Error, ExpressionError};
use crate::evaluator::{RuleResults, WorkflowEvaluator, WorkflowResults};
use crate::expression::{ExpressionEvaluator, Interpreter};
use crate::rule::Context;
use crate::workflow::Workflow;

pub struct Engine<T: ?Sized, E = Interpreter> {
    workflows: IndexMap<String, Workflow>,
    actions: ActionRegistry<T>,
    evaluator: WorkflowEvaluator<E>,
}

/// A rule whose expression failed validation
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidRule {
    pub workflow: String,
    pub rule: String,
    pub error: ExpressionError,
}

impl<T: ?Sized> Engine<T, Interpreter> {
    /// Build an engine over `workflows` with the default interpreter
    pub fn new(workflows: impl IntoIterator<Item = Workflow>) -> Result<Self, DuplicateWorkflowNameError> {
        Self::with_evaluator(workflows, Interpreter::new())
    }

    /// Build an engine whose interpreter uses the configured input binding
    pub fn from_config(
        workflows: impl IntoIterator<Item = Workflow>,
        config: &Config,
    ) -> Result<Self, DuplicateWorkflowNameError> {
        Self::with_evaluator(workflows, Interpreter::with_binding(config.engine.input_binding.as_str()))
    }
}

impl<T: ?Sized, E> Engine<T, E> {
    pub fn with_evaluator(
        workflows: impl IntoIterator<Item = Workflow>,
        evaluator: E,
    ) -> Result<Self, DuplicateWorkflowNameError> {
        let workflows = index_by_name(workflows)?;
        debug!(workflows = workflows.len(), "engine created");

        Ok(Self {
            workflows,
            actions: ActionRegistry::new(),
            evaluator: WorkflowEvaluator::new(evaluator),
        })
    }

    /// Register an action instance under its type name
    pub fn register_action<A>(&mut self, action: A) -> Result<(), DuplicateActionError>
    where
        A: Action<T> + 'static,
    {
        self.actions.register(action_name::<A>(), action)
    }

    /// Register a default-constructed action under its type name
    pub fn register_default_action<A>(&mut self) -> Result<(), DuplicateActionError>
    where
        A: Action<T> + Default + 'static,
    {
        self.register_action(A::default())
    }

    /// Register an action instance under an explicit name
    pub fn register_action_as<A>(&mut self, name: impl Into<String>, action: A) -> Result<(), DuplicateActionError>
    where
        A: Action<T> + 'static,
    {
        self.actions.register(name, action)
    }

    pub fn register_fn<F>(&mut self, name: impl Into<String>, handler: F) -> Result<(), DuplicateActionError>
    where
        F: Fn(&mut T, &Context) + Send + Sync + 'static,
    {
        self.actions.register_fn(name, handler)
    }

    pub fn workflow(&self, name: &str) -> Option<&Workflow> {
        self.workflows.get(name)
    }

    /// Registered workflows in registration order
    pub fn workflows(&self) -> impl Iterator<Item = &Workflow> {
        self.workflows.values()
    }

    pub fn actions(&self) -> &ActionRegistry<T> {
        &self.actions
    }
}

impl<T: ?Sized, E: ExpressionEvaluator<T>> Engine<T, E> {
    /// Evaluate one workflow, registered or not
    pub fn evaluate(&self, input: &mut T, workflow: &Workflow) -> Result<RuleResults, ExpressionError> {
        self.evaluator.evaluate_workflow(input, &self.actions, workflow)
    }

    /// Evaluate a registered workflow by name; an unknown name yields empty results
    pub fn evaluate_named(&self, input: &mut T, name: &str) -> Result<RuleResults, ExpressionError> {
        match self.workflows.get(name) {
            Some(workflow) => self.evaluate(input, workflow),
            None => {
                debug!(workflow = name, "workflow not registered, nothing to evaluate");
                Ok(RuleResults::new())
            }
        }
    }

    /// Evaluate every registered workflow in registration order
    #[instrument(level = "debug", skip_all, fields(workflows = self.workflows.len()))]
    pub fn evaluate_all(&self, input: &mut T) -> Result<WorkflowResults, ExpressionError> {
        let mut results = WorkflowResults::with_capacity(self.workflows.len());
        for (name, workflow) in &self.workflows {
            results.insert(name.clone(), self.evaluate(input, workflow)?);
        }
        Ok(results)
    }

    /// Evaluate an explicitly supplied set of workflows instead of the registered ones
    ///
    /// The set is checked for duplicate names before any rule runs.
    pub fn evaluate_all_with<'w>(
        &self,
        input: &mut T,
        workflows: impl IntoIterator<Item = &'w Workflow>,
    ) -> Result<WorkflowResults, Error> {
        let workflows: Vec<&Workflow> = workflows.into_iter().collect();
        let mut results = WorkflowResults::with_capacity(workflows.len());
        for workflow in &workflows {
            if results.insert(workflow.name().to_string(), RuleResults::new()).is_some() {
                return Err(DuplicateWorkflowNameError {
                    name: workflow.name().to_string(),
                }
                .into());
            }
        }

        for workflow in workflows {
            let rule_results = self.evaluate(input, workflow)?;
            results.insert(workflow.name().to_string(), rule_results);
        }
        Ok(results)
    }

    /// Validate every rule expression of the registered workflows
    pub fn check(&self) -> Vec<InvalidRule> {
        let expressions = self.evaluator.expressions();
        self.workflows
            .values()
            .flat_map(|workflow| {
                workflow.rules().iter().filter_map(move |rule| {
                    expressions
                        .check(rule.expression())
                        .err()
                        .map(|error| InvalidRule {
                            workflow: workflow.name().to_string(),
                            rule: rule.name().to_string(),
                            error,
                        })
                })
            })
            .collect()
    }
}

impl<T: ?Sized, E> std::fmt::Debug for Engine<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("workflows", &self.workflows.keys().collect::<Vec<_>>())
            .field("actions", &self.actions)
            .finish()
    }
}

/// Key workflows by name, keeping their order and rejecting duplicates
pub(crate) fn index_by_name(
    workflows: impl IntoIterator<Item = Workflow>,
) -> Result<IndexMap<String, Workflow>, DuplicateWorkflowNameError> {
    let mut indexed = IndexMap::new();
    for workflow in workflows {
        let name = workflow.name().to_string();
        if indexed.contains_key(&name) {
            return Err(DuplicateWorkflowNameError { name });
        }
        indexed.insert(name, workflow);
    }
    Ok(indexed)
}
