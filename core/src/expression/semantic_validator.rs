//! Semantic validation for parsed expressions
//!
//! The grammar accepts any identifier and any call; this pass rejects the ones that can
//! never evaluate, so a broken rule is caught before it reaches an input.

use super::ast::Expr;
use super::functions;
use crate::error::ExpressionErrorKind;

/// Identifiers that cannot be used as the input binding name
pub const RESERVED_IDENTIFIERS: &[&str] = &["true", "false", "null"];

/// Validate an expression against the binding it will be evaluated with
///
/// Current rules:
/// - the only free identifier is the binding name
/// - every call names a built-in function with a valid argument count
pub fn validate_expression(expr: &Expr, binding: &str) -> Result<(), ExpressionErrorKind> {
    match expr {
        Expr::LitNull | Expr::LitBool { .. } | Expr::LitNum { .. } | Expr::LitStr { .. } => Ok(()),
        Expr::Ident { name } => {
            if name == binding {
                Ok(())
            } else {
                Err(ExpressionErrorKind::UnknownIdentifier(name.clone()))
            }
        }
        Expr::Member { object, .. } => validate_expression(object, binding),
        Expr::Index { object, index } => {
            validate_expression(object, binding)?;
            validate_expression(index, binding)
        }
        Expr::Call { function, args } => {
            let spec = functions::lookup(function)
                .ok_or_else(|| ExpressionErrorKind::UnknownFunction(function.clone()))?;
            spec.check_arity(args.len())?;
            args.iter().try_for_each(|arg| validate_expression(arg, binding))
        }
        Expr::Unary { operand, .. } => validate_expression(operand, binding),
        Expr::Binary { left, right, .. } => {
            validate_expression(left, binding)?;
            validate_expression(right, binding)
        }
    }
}

/// Whether `name` can serve as the input binding
pub fn is_valid_binding(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVED_IDENTIFIERS.contains(&name)
}
