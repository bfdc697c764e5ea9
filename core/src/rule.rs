use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::actions::action_name;

/// Static key-value data attached to a rule and handed to whichever action it triggers
pub type Context = HashMap<String, JsonValue>;

/// A named boolean check plus up to three associated action names
///
/// Rules are immutable once built. The builder methods consume and return the rule, so
/// a rule is assembled in one expression and never changed afterwards:
///
/// ```
/// use ruleflow_core::Rule;
/// use serde_json::json;
///
/// let rule = Rule::new("isLoyaltyMember", "input.IsLoyaltyMember")
///     .on_success("AddDiscount")
///     .with_context_value("discount", json!(5));
/// assert_eq!(rule.on_success_name(), Some("AddDiscount"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    name: String,
    expression: String,
    /// Runs whether the rule passes or fails, and always first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    on_evaluation: Option<String>,
    /// Runs only if the rule passes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    on_success: Option<String>,
    /// Runs only if the rule fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    on_failure: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    context: Context,
}

impl Rule {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            on_evaluation: None,
            on_success: None,
            on_failure: None,
            context: Context::new(),
        }
    }

    pub fn on_evaluation(mut self, action: impl Into<String>) -> Self {
        self.on_evaluation = Some(action.into());
        self
    }

    pub fn on_success(mut self, action: impl Into<String>) -> Self {
        self.on_success = Some(action.into());
        self
    }

    pub fn on_failure(mut self, action: impl Into<String>) -> Self {
        self.on_failure = Some(action.into());
        self
    }

    /// Reference an action by its type, using the same name the engine registers it under
    pub fn on_evaluation_action<A: ?Sized>(self) -> Self {
        self.on_evaluation(action_name::<A>())
    }

    pub fn on_success_action<A: ?Sized>(self) -> Self {
        self.on_success(action_name::<A>())
    }

    pub fn on_failure_action<A: ?Sized>(self) -> Self {
        self.on_failure(action_name::<A>())
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn with_context_value(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn on_evaluation_name(&self) -> Option<&str> {
        self.on_evaluation.as_deref()
    }

    pub fn on_success_name(&self) -> Option<&str> {
        self.on_success.as_deref()
    }

    pub fn on_failure_name(&self) -> Option<&str> {
        self.on_failure.as_deref()
    }

    pub fn context(&self) -> &Context {
        &self.context
    }
}
