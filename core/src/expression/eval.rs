//! Expression evaluation
//!
//! Walks the AST against a single named binding. Evaluation is pure: the bound value
//! is a snapshot of the input and is never written back.
//!
//! The input stays JSON while member and index accesses walk into it. Only the value an
//! access finally yields is converted to a [`Val`], so parts of the input that no
//! expression reads are never converted.

use std::cmp::Ordering;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::functions;
use super::values::{json_type_name, parse_datetime, Val};
use crate::error::ExpressionErrorKind;

pub type EvalResult = Result<Val, ExpressionErrorKind>;

/// The single variable visible to an expression
pub struct Binding<'a> {
    pub name: &'a str,
    pub value: &'a JsonValue,
}

/// Result of an access path: still inside the input document, or already a value
enum Place<'j> {
    Json(&'j JsonValue),
    Owned(Val),
}

impl Place<'_> {
    fn into_val(self) -> EvalResult {
        match self {
            Place::Json(json) => Val::from_json(json),
            Place::Owned(value) => Ok(value),
        }
    }
}

/// Evaluate an expression to a value
pub fn eval_expr(expr: &Expr, binding: &Binding) -> EvalResult {
    match expr {
        Expr::LitNull => Ok(Val::Null),

        Expr::LitBool { v } => Ok(Val::Bool(*v)),

        Expr::LitNum { v } => Ok(Val::Num(*v)),

        Expr::LitStr { v } => Ok(Val::Str(v.clone())),

        Expr::Ident { .. } | Expr::Member { .. } | Expr::Index { .. } => place(expr, binding)?.into_val(),

        Expr::Call { function, args } => {
            let args = args
                .iter()
                .map(|arg| eval_expr(arg, binding))
                .collect::<Result<Vec<_>, _>>()?;
            functions::call(function, args)
        }

        Expr::Unary { op, operand } => {
            let value = eval_expr(operand, binding)?;
            match (op, value) {
                (UnaryOp::Not, Val::Bool(b)) => Ok(Val::Bool(!b)),
                (UnaryOp::Neg, Val::Num(n)) => Ok(Val::Num(-n)),
                (UnaryOp::Not, other) => Err(ExpressionErrorKind::Type(format!(
                    "operator '!' expects a boolean, got {}",
                    other.type_name()
                ))),
                (UnaryOp::Neg, other) => Err(ExpressionErrorKind::Type(format!(
                    "operator '-' expects a number, got {}",
                    other.type_name()
                ))),
            }
        }

        Expr::Binary { op, left, right } => match op {
            // Short-circuit: the right side is only evaluated when needed
            BinaryOp::And => {
                if !expect_bool(*op, eval_expr(left, binding)?)? {
                    return Ok(Val::Bool(false));
                }
                Ok(Val::Bool(expect_bool(*op, eval_expr(right, binding)?)?))
            }
            BinaryOp::Or => {
                if expect_bool(*op, eval_expr(left, binding)?)? {
                    return Ok(Val::Bool(true));
                }
                Ok(Val::Bool(expect_bool(*op, eval_expr(right, binding)?)?))
            }
            _ => {
                let left = eval_expr(left, binding)?;
                let right = eval_expr(right, binding)?;
                eval_binary(*op, left, right)
            }
        },
    }
}

/// Resolve an access path without converting what it passes through
fn place<'j>(expr: &Expr, binding: &Binding<'j>) -> Result<Place<'j>, ExpressionErrorKind> {
    match expr {
        Expr::Ident { name } => {
            if name == binding.name {
                Ok(Place::Json(binding.value))
            } else {
                Err(ExpressionErrorKind::UnknownIdentifier(name.clone()))
            }
        }
        Expr::Member { object, property } => member(place(object, binding)?, property),
        Expr::Index { object, index } => {
            let object = place(object, binding)?;
            let index = eval_expr(index, binding)?;
            index_place(object, index)
        }
        other => eval_expr(other, binding).map(Place::Owned),
    }
}

fn member<'j>(object: Place<'j>, property: &str) -> Result<Place<'j>, ExpressionErrorKind> {
    let missing = || ExpressionErrorKind::MissingMember(property.to_string());
    match object {
        Place::Json(JsonValue::Object(map)) => map.get(property).map(Place::Json).ok_or_else(missing),
        Place::Owned(Val::Obj(mut map)) => map.remove(property).map(Place::Owned).ok_or_else(missing),
        Place::Json(other) => Err(no_member(property, json_type_name(other))),
        Place::Owned(other) => Err(no_member(property, other.type_name())),
    }
}

fn no_member(property: &str, type_name: &str) -> ExpressionErrorKind {
    ExpressionErrorKind::Type(format!("cannot read member '{}' of {}", property, type_name))
}

fn index_place(object: Place<'_>, index: Val) -> Result<Place<'_>, ExpressionErrorKind> {
    match (object, index) {
        (Place::Json(JsonValue::Array(items)), Val::Num(n)) => {
            let i = list_position(n, items.len())?;
            Ok(Place::Json(&items[i]))
        }
        (Place::Json(JsonValue::Object(map)), Val::Str(key)) => map
            .get(&key)
            .map(Place::Json)
            .ok_or(ExpressionErrorKind::MissingMember(key)),
        (Place::Json(JsonValue::String(s)), Val::Num(n)) => string_index(s, n).map(Place::Owned),
        (Place::Json(object), index) => Err(cannot_index(json_type_name(object), &index)),
        (Place::Owned(object), index) => eval_index(object, index).map(Place::Owned),
    }
}

fn eval_index(object: Val, index: Val) -> EvalResult {
    match (object, index) {
        (Val::List(mut items), Val::Num(n)) => {
            let i = list_position(n, items.len())?;
            Ok(items.swap_remove(i))
        }
        (Val::Obj(mut map), Val::Str(key)) => map
            .remove(&key)
            .ok_or(ExpressionErrorKind::MissingMember(key)),
        (Val::Str(s), Val::Num(n)) => string_index(&s, n),
        (object, index) => Err(cannot_index(object.type_name(), &index)),
    }
}

/// Turn a list index into a position; negative indexes count from the end
fn list_position(n: Decimal, len: usize) -> Result<usize, ExpressionErrorKind> {
    let position = n
        .to_i64()
        .filter(|_| n.fract().is_zero())
        .ok_or_else(|| ExpressionErrorKind::Type(format!("list index {} is not an integer", n)))?;
    let resolved = if position < 0 {
        i64::try_from(len).ok().map(|len| len + position)
    } else {
        Some(position)
    };
    resolved
        .and_then(|i| usize::try_from(i).ok())
        .filter(|i| *i < len)
        .ok_or(ExpressionErrorKind::IndexOutOfBounds { index: position, len })
}

fn string_index(s: &str, n: Decimal) -> EvalResult {
    let chars: Vec<char> = s.chars().collect();
    let i = list_position(n, chars.len())?;
    Ok(Val::Str(chars[i].to_string()))
}

fn cannot_index(object: &str, index: &Val) -> ExpressionErrorKind {
    ExpressionErrorKind::Type(format!("cannot index {} with {}", object, index.type_name()))
}

fn expect_bool(op: BinaryOp, value: Val) -> Result<bool, ExpressionErrorKind> {
    match value {
        Val::Bool(b) => Ok(b),
        other => Err(ExpressionErrorKind::Type(format!(
            "operator '{}' expects booleans, got {}",
            op.symbol(),
            other.type_name()
        ))),
    }
}

fn eval_binary(op: BinaryOp, left: Val, right: Val) -> EvalResult {
    match op {
        BinaryOp::Eq => Ok(Val::Bool(values_equal(op, &left, &right)?)),
        BinaryOp::Ne => Ok(Val::Bool(!values_equal(op, &left, &right)?)),
        BinaryOp::Lt => Ok(Val::Bool(compare(op, &left, &right)? == Ordering::Less)),
        BinaryOp::Le => Ok(Val::Bool(compare(op, &left, &right)? != Ordering::Greater)),
        BinaryOp::Gt => Ok(Val::Bool(compare(op, &left, &right)? == Ordering::Greater)),
        BinaryOp::Ge => Ok(Val::Bool(compare(op, &left, &right)? != Ordering::Less)),
        BinaryOp::Add => match (left, right) {
            (Val::Num(a), Val::Num(b)) => a.checked_add(b).map(Val::Num).ok_or(ExpressionErrorKind::Overflow),
            (Val::Str(a), Val::Str(b)) => Ok(Val::Str(a + &b)),
            (Val::Str(a), other) => Ok(Val::Str(format!("{}{}", a, plain(&other)))),
            (other, Val::Str(b)) => Ok(Val::Str(format!("{}{}", plain(&other), b))),
            (a, b) => Err(operand_types(op, &a, &b)),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            let (Val::Num(a), Val::Num(b)) = (&left, &right) else {
                return Err(operand_types(op, &left, &right));
            };
            if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b.is_zero() {
                return Err(ExpressionErrorKind::DivisionByZero);
            }
            let result = match op {
                BinaryOp::Sub => a.checked_sub(*b),
                BinaryOp::Mul => a.checked_mul(*b),
                BinaryOp::Div => a.checked_div(*b),
                _ => a.checked_rem(*b),
            };
            result.map(Val::Num).ok_or(ExpressionErrorKind::Overflow)
        }
        BinaryOp::And | BinaryOp::Or => {
            let left = expect_bool(op, left)?;
            let right = expect_bool(op, right)?;
            Ok(Val::Bool(if op == BinaryOp::And { left && right } else { left || right }))
        }
    }
}

/// Equality between values of the same type; null compares with anything.
/// Strings are coerced to dates when compared against a datetime.
fn values_equal(op: BinaryOp, left: &Val, right: &Val) -> Result<bool, ExpressionErrorKind> {
    match (left, right) {
        (Val::Null, other) | (other, Val::Null) => Ok(matches!(other, Val::Null)),
        (Val::DateTime(_), Val::Str(_)) | (Val::Str(_), Val::DateTime(_)) => {
            Ok(compare(op, left, right)? == Ordering::Equal)
        }
        (a, b) if std::mem::discriminant(a) == std::mem::discriminant(b) => Ok(a == b),
        (a, b) => Err(operand_types(op, a, b)),
    }
}

fn compare(op: BinaryOp, left: &Val, right: &Val) -> Result<Ordering, ExpressionErrorKind> {
    match (left, right) {
        (Val::Num(a), Val::Num(b)) => Ok(a.cmp(b)),
        (Val::Str(a), Val::Str(b)) => Ok(a.cmp(b)),
        (Val::DateTime(a), Val::DateTime(b)) => Ok(a.cmp(b)),
        (Val::DateTime(a), Val::Str(s)) => Ok(a.cmp(&coerce_datetime(s)?)),
        (Val::Str(s), Val::DateTime(b)) => Ok(coerce_datetime(s)?.cmp(b)),
        (a, b) => Err(operand_types(op, a, b)),
    }
}

fn coerce_datetime(s: &str) -> Result<chrono::NaiveDateTime, ExpressionErrorKind> {
    parse_datetime(s)
        .ok_or_else(|| ExpressionErrorKind::Type(format!("cannot compare '{}' with a datetime", s)))
}

fn operand_types(op: BinaryOp, left: &Val, right: &Val) -> ExpressionErrorKind {
    ExpressionErrorKind::Type(format!(
        "operator '{}' cannot be applied to {} and {}",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}

/// String form used for concatenation
fn plain(value: &Val) -> String {
    match value {
        Val::Str(s) => s.clone(),
        Val::Num(n) => n.normalize().to_string(),
        other => other.to_string(),
    }
}
