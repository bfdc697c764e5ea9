use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::rule::Rule;

/// A named, ordered sequence of rules
///
/// Rule order is evaluation order. Construction rejects empty names, empty expressions
/// and duplicate rule names, so every rule maps to exactly one result entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WorkflowDef")]
pub struct Workflow {
    name: String,
    rules: Vec<Rule>,
}

/// Unvalidated shape used for deserialization
#[derive(Deserialize)]
struct WorkflowDef {
    name: String,
    #[serde(default)]
    rules: Vec<Rule>,
}

impl TryFrom<WorkflowDef> for Workflow {
    type Error = WorkflowError;

    fn try_from(def: WorkflowDef) -> Result<Self, Self::Error> {
        Workflow::new(def.name, def.rules)
    }
}

impl Workflow {
    pub fn new(name: impl Into<String>, rules: impl IntoIterator<Item = Rule>) -> Result<Self, WorkflowError> {
        let name = name.into();
        let rules: Vec<Rule> = rules.into_iter().collect();

        if name.trim().is_empty() {
            return Err(WorkflowError::EmptyWorkflowName);
        }

        let mut seen = HashSet::new();
        for (position, rule) in rules.iter().enumerate() {
            if rule.name().trim().is_empty() {
                return Err(WorkflowError::EmptyRuleName {
                    workflow: name,
                    position,
                });
            }
            if rule.expression().trim().is_empty() {
                return Err(WorkflowError::EmptyExpression {
                    workflow: name,
                    rule: rule.name().to_string(),
                });
            }
            if !seen.insert(rule.name()) {
                return Err(WorkflowError::DuplicateRuleName {
                    workflow: name,
                    rule: rule.name().to_string(),
                });
            }
        }

        Ok(Self { name, rules })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.name() == name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
