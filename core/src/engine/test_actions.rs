//! Inputs and actions shared by the engine tests

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::actions::Action;
use crate::rule::Context;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComplexWorkflowInput {
    pub total_cost: Decimal,
    pub total_discount: Decimal,
    pub birthday: NaiveDate,
    pub is_loyalty_member: bool,
    pub cart_prices: Vec<Decimal>,
}

/// Adds the rule context's `discount` percentage to the accumulated discount
#[derive(Default)]
pub struct AddDiscount;

impl Action<ComplexWorkflowInput> for AddDiscount {
    fn handle(&self, input: &mut ComplexWorkflowInput, context: &Context) {
        let Some(value) = context.get("discount") else {
            return;
        };
        let parsed = match value {
            JsonValue::String(s) => Decimal::from_str(s.trim()),
            other => Decimal::from_str(&other.to_string()),
        };
        if let Ok(discount) = parsed {
            input.total_discount += discount;
        }
    }
}

/// Totals the cart and takes the accumulated discount off
#[derive(Default)]
pub struct ApplyDiscounts;

impl Action<ComplexWorkflowInput> for ApplyDiscounts {
    fn handle(&self, input: &mut ComplexWorkflowInput, _context: &Context) {
        for price in &input.cart_prices {
            input.total_cost += *price;
        }
        let discount = input.total_cost / Decimal::ONE_HUNDRED * input.total_discount;
        input.total_cost -= discount;
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvocationTestInput {
    pub some_number: i64,
    pub on_evaluation_action_was_invoked: bool,
    pub on_success_action_was_invoked: bool,
    pub on_failure_action_was_invoked: bool,
}

impl InvocationTestInput {
    pub fn with_number(some_number: i64) -> Self {
        Self {
            some_number,
            ..Default::default()
        }
    }

    pub fn reset(&mut self) {
        self.on_evaluation_action_was_invoked = false;
        self.on_success_action_was_invoked = false;
        self.on_failure_action_was_invoked = false;
    }
}

#[derive(Default)]
pub struct SetEvaluationActionAsInvoked;

impl Action<InvocationTestInput> for SetEvaluationActionAsInvoked {
    fn handle(&self, input: &mut InvocationTestInput, _context: &Context) {
        input.on_evaluation_action_was_invoked = true;
    }
}

#[derive(Default)]
pub struct SetSuccessActionAsInvoked;

impl Action<InvocationTestInput> for SetSuccessActionAsInvoked {
    fn handle(&self, input: &mut InvocationTestInput, _context: &Context) {
        input.on_success_action_was_invoked = true;
    }
}

#[derive(Default)]
pub struct SetFailureActionAsInvoked;

impl Action<InvocationTestInput> for SetFailureActionAsInvoked {
    fn handle(&self, input: &mut InvocationTestInput, _context: &Context) {
        input.on_failure_action_was_invoked = true;
    }
}
