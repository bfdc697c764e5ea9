//! Workflow evaluation loop
//!
//! Runs the rules of one workflow in order against one input. For each rule:
//!
//! 1. evaluate the expression and record `(rule name, passed)`
//! 2. dispatch the on-evaluation action, whatever the outcome
//! 3. dispatch exactly one of the on-success / on-failure actions, matching the outcome
//!
//! Unregistered action names are skipped. Actions may mutate the input, and later rules
//! see those mutations. An expression error aborts the run and the partial results are
//! dropped with it.

use indexmap::IndexMap;
use tracing::{debug, instrument};

use crate::actions::ActionRegistry;
use crate::error::ExpressionError;
use crate::expression::ExpressionEvaluator;
use crate::rule::Rule;
use crate::workflow::Workflow;

/// Rule name → passed, in rule order
pub type RuleResults = IndexMap<String, bool>;

/// Workflow name → per-rule results, in evaluation order
pub type WorkflowResults = IndexMap<String, RuleResults>;

/// Which outcome action, if any, followed a rule's evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    SuccessDispatched,
    FailureDispatched,
    NoOutcomeAction,
}

#[derive(Debug, Clone, Default)]
pub struct WorkflowEvaluator<E> {
    expressions: E,
}

impl<E> WorkflowEvaluator<E> {
    pub fn new(expressions: E) -> Self {
        Self { expressions }
    }

    pub fn expressions(&self) -> &E {
        &self.expressions
    }

    /// Evaluate every rule of `workflow` against `input`
    #[instrument(level = "debug", skip_all, fields(workflow = %workflow.name(), rules = workflow.len()))]
    pub fn evaluate_workflow<T>(
        &self,
        input: &mut T,
        registry: &ActionRegistry<T>,
        workflow: &Workflow,
    ) -> Result<RuleResults, ExpressionError>
    where
        T: ?Sized,
        E: ExpressionEvaluator<T>,
    {
        let mut results = RuleResults::with_capacity(workflow.len());

        for rule in workflow.rules() {
            let passed = self.expressions.evaluate(rule.expression(), input)?;
            results.insert(rule.name().to_string(), passed);

            let outcome = dispatch_actions(rule, passed, input, registry);
            debug!(rule = rule.name(), passed, ?outcome, "rule evaluated");
        }

        Ok(results)
    }
}

/// Run the actions configured on `rule` for the given outcome
fn dispatch_actions<T: ?Sized>(rule: &Rule, passed: bool, input: &mut T, registry: &ActionRegistry<T>) -> Outcome {
    if let Some(name) = rule.on_evaluation_name() {
        registry.dispatch(name, input, rule.context());
    }

    let (action, dispatched) = if passed {
        (rule.on_success_name(), Outcome::SuccessDispatched)
    } else {
        (rule.on_failure_name(), Outcome::FailureDispatched)
    };

    let ran = match action {
        Some(name) => registry.dispatch(name, input, rule.context()),
        None => false,
    };
    if ran {
        dispatched
    } else {
        Outcome::NoOutcomeAction
    }
}
