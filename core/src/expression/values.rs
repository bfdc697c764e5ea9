//! Runtime value types

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use crate::error::ExpressionErrorKind;

/// Runtime value type
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Null,
    Bool(bool),
    Num(Decimal),
    Str(String),
    DateTime(NaiveDateTime),
    List(Vec<Val>),
    Obj(HashMap<String, Val>),
}

impl Val {
    /// Name of the value's type, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Null => "null",
            Val::Bool(_) => "boolean",
            Val::Num(_) => "number",
            Val::Str(_) => "string",
            Val::DateTime(_) => "datetime",
            Val::List(_) => "list",
            Val::Obj(_) => "object",
        }
    }

    /// Convert a JSON document into a runtime value.
    ///
    /// Numbers go through their decimal text so `5.7` stays exactly `5.7`.
    pub fn from_json(value: &JsonValue) -> Result<Val, ExpressionErrorKind> {
        Ok(match value {
            JsonValue::Null => Val::Null,
            JsonValue::Bool(b) => Val::Bool(*b),
            JsonValue::Number(n) => Val::Num(json_number_to_decimal(n)?),
            JsonValue::String(s) => Val::Str(s.clone()),
            JsonValue::Array(items) => Val::List(
                items
                    .iter()
                    .map(Val::from_json)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            JsonValue::Object(map) => Val::Obj(
                map.iter()
                    .map(|(k, v)| Val::from_json(v).map(|val| (k.clone(), val)))
                    .collect::<Result<HashMap<_, _>, _>>()?,
            ),
        })
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Null => write!(f, "null"),
            Val::Bool(b) => write!(f, "{}", b),
            Val::Num(n) => write!(f, "{}", n.normalize()),
            Val::Str(s) => write!(f, "\"{}\"", s),
            Val::DateTime(dt) => write!(f, "{}", dt),
            Val::List(items) => write!(f, "list of {} item(s)", items.len()),
            Val::Obj(map) => write!(f, "object with {} member(s)", map.len()),
        }
    }
}

/// Type name a JSON value will have once converted, for error messages
pub fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "object",
    }
}

fn json_number_to_decimal(n: &serde_json::Number) -> Result<Decimal, ExpressionErrorKind> {
    let text = n.to_string();
    let parsed = if text.contains(['e', 'E']) {
        Decimal::from_scientific(&text)
    } else {
        Decimal::from_str(&text)
    };
    parsed.map_err(|_| ExpressionErrorKind::InputConversion(format!("number {} is out of range", text)))
}

/// Parse a date or date-time string.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS[.fff]`, `YYYY-MM-DD HH:MM:SS` and plain `YYYY-MM-DD`.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
