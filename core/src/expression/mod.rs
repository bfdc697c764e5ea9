//! Expression evaluation for rule checks
//!
//! The workflow evaluator only depends on [`ExpressionEvaluator`]. [`Interpreter`] is the
//! default implementation: it serializes the input to a JSON property bag, binds it to a
//! single identifier (`input` unless configured otherwise) and evaluates a small C-like
//! expression language over it.
//!
//! ```
//! use ruleflow_core::expression::{ExpressionEvaluator, Interpreter};
//! use serde_json::json;
//!
//! let interpreter = Interpreter::new();
//! let input = json!({ "SomeNumber": 1 });
//! assert!(interpreter.evaluate("input.SomeNumber == 1", &input).unwrap());
//! ```

pub mod ast;
mod eval;
pub mod functions;
mod parser;
pub mod semantic_validator;
pub mod values;

#[cfg(test)]
mod tests;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{ExpressionError, ExpressionErrorKind};
use ast::Expr;
use eval::{eval_expr, Binding};
pub use values::Val;

/// Contract between the workflow evaluator and whatever evaluates rule expressions
pub trait ExpressionEvaluator<T: ?Sized> {
    /// Evaluate `expression` against `input`, which must produce a boolean
    fn evaluate(&self, expression: &str, input: &T) -> Result<bool, ExpressionError>;

    /// Check that `expression` could be evaluated, without an input
    fn check(&self, _expression: &str) -> Result<(), ExpressionError> {
        Ok(())
    }
}

/// Default expression evaluator
#[derive(Debug, Clone)]
pub struct Interpreter {
    binding: String,
}

impl Interpreter {
    pub const DEFAULT_BINDING: &'static str = "input";

    pub fn new() -> Self {
        Self::with_binding(Self::DEFAULT_BINDING)
    }

    /// Use `binding` as the identifier through which expressions see the input
    pub fn with_binding(binding: impl Into<String>) -> Self {
        Self {
            binding: binding.into(),
        }
    }

    pub fn binding(&self) -> &str {
        &self.binding
    }

    /// Parse and validate an expression
    pub fn compile(&self, expression: &str) -> Result<CompiledExpression, ExpressionError> {
        let fail = |kind| ExpressionError::new(expression, kind);
        let ast = parser::parse(expression).map_err(fail)?;
        semantic_validator::validate_expression(&ast, &self.binding).map_err(fail)?;
        Ok(CompiledExpression {
            source: expression.to_string(),
            binding: self.binding.clone(),
            ast,
        })
    }

    /// Parse and validate an expression, discarding the result
    pub fn check(&self, expression: &str) -> Result<(), ExpressionError> {
        self.compile(expression).map(|_| ())
    }

    /// Evaluate an expression to any value rather than requiring a boolean
    pub fn evaluate_value(&self, expression: &str, input: &JsonValue) -> Result<Val, ExpressionError> {
        let compiled = self.compile(expression)?;
        compiled.evaluate(input)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serialize + ?Sized> ExpressionEvaluator<T> for Interpreter {
    fn evaluate(&self, expression: &str, input: &T) -> Result<bool, ExpressionError> {
        let compiled = self.compile(expression)?;
        let json = serde_json::to_value(input).map_err(|err| {
            ExpressionError::new(expression, ExpressionErrorKind::InputConversion(err.to_string()))
        })?;
        compiled.evaluate_bool(&json)
    }

    fn check(&self, expression: &str) -> Result<(), ExpressionError> {
        Interpreter::check(self, expression)
    }
}

/// A parsed, validated expression ready to run against many inputs
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    source: String,
    binding: String,
    ast: Expr,
}

impl CompiledExpression {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    pub fn evaluate(&self, input: &JsonValue) -> Result<Val, ExpressionError> {
        let binding = Binding {
            name: &self.binding,
            value: input,
        };
        eval_expr(&self.ast, &binding).map_err(|kind| ExpressionError::new(self.source.as_str(), kind))
    }

    pub fn evaluate_bool(&self, input: &JsonValue) -> Result<bool, ExpressionError> {
        match self.evaluate(input)? {
            Val::Bool(b) => Ok(b),
            other => Err(ExpressionError::new(
                self.source.as_str(),
                ExpressionErrorKind::NotBoolean(other.type_name().to_string()),
            )),
        }
    }
}
