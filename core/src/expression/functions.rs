//! Built-in functions callable from rule expressions

use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::values::{parse_datetime, Val};
use crate::error::ExpressionErrorKind;

type CallResult = Result<Val, ExpressionErrorKind>;

/// Name and accepted argument count of a built-in function
#[derive(Debug, Clone, Copy)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: Option<usize>,
}

const fn spec(name: &'static str, min_args: usize, max_args: Option<usize>) -> FunctionSpec {
    FunctionSpec {
        name,
        min_args,
        max_args,
    }
}

pub const FUNCTIONS: &[FunctionSpec] = &[
    spec("len", 1, Some(1)),
    spec("sum", 1, Some(1)),
    spec("min", 1, None),
    spec("max", 1, None),
    spec("abs", 1, Some(1)),
    spec("round", 1, Some(2)),
    spec("contains", 2, Some(2)),
    spec("starts_with", 2, Some(2)),
    spec("ends_with", 2, Some(2)),
    spec("lower", 1, Some(1)),
    spec("upper", 1, Some(1)),
    spec("date", 1, Some(3)),
    spec("datetime", 1, Some(1)),
    spec("now", 0, Some(0)),
    spec("today", 0, Some(0)),
    spec("year", 1, Some(1)),
    spec("month", 1, Some(1)),
    spec("day", 1, Some(1)),
    spec("days_between", 2, Some(2)),
];

pub fn lookup(name: &str) -> Option<&'static FunctionSpec> {
    FUNCTIONS.iter().find(|f| f.name == name)
}

impl FunctionSpec {
    pub fn check_arity(&self, actual: usize) -> Result<(), ExpressionErrorKind> {
        let too_many = self.max_args.is_some_and(|max| actual > max);
        if actual < self.min_args || too_many {
            return Err(ExpressionErrorKind::Arity {
                name: self.name.to_string(),
                expected: self.expected(),
                actual,
            });
        }
        Ok(())
    }

    fn expected(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => max.to_string(),
            Some(max) => format!("{} to {}", self.min_args, max),
            None => format!("at least {}", self.min_args),
        }
    }
}

/// Invoke a built-in function on already evaluated arguments
pub fn call(name: &str, args: Vec<Val>) -> CallResult {
    let spec = lookup(name).ok_or_else(|| ExpressionErrorKind::UnknownFunction(name.to_string()))?;
    spec.check_arity(args.len())?;

    match name {
        "len" => len(&args[0]),
        "sum" => sum(&args[0]),
        "min" => extremum(name, &args, |candidate, best| candidate < best),
        "max" => extremum(name, &args, |candidate, best| candidate > best),
        "abs" => Ok(Val::Num(number(name, &args[0])?.abs())),
        "round" => round(&args),
        "contains" => contains(&args[0], &args[1]),
        "starts_with" => Ok(Val::Bool(string(name, &args[0])?.starts_with(string(name, &args[1])?))),
        "ends_with" => Ok(Val::Bool(string(name, &args[0])?.ends_with(string(name, &args[1])?))),
        "lower" => Ok(Val::Str(string(name, &args[0])?.to_lowercase())),
        "upper" => Ok(Val::Str(string(name, &args[0])?.to_uppercase())),
        "date" => date(&args),
        "datetime" => Ok(Val::DateTime(datetime(name, &args[0])?)),
        "now" => Ok(Val::DateTime(Utc::now().naive_utc())),
        "today" => Ok(Val::DateTime(midnight(Utc::now().date_naive())?)),
        "year" => Ok(Val::Num(datetime(name, &args[0])?.year().into())),
        "month" => Ok(Val::Num(datetime(name, &args[0])?.month().into())),
        "day" => Ok(Val::Num(datetime(name, &args[0])?.day().into())),
        "days_between" => {
            let from = datetime(name, &args[0])?;
            let to = datetime(name, &args[1])?;
            Ok(Val::Num((to - from).num_days().into()))
        }
        _ => Err(ExpressionErrorKind::UnknownFunction(name.to_string())),
    }
}

/* ===================== Argument helpers ===================== */

fn number(function: &str, value: &Val) -> Result<Decimal, ExpressionErrorKind> {
    match value {
        Val::Num(n) => Ok(*n),
        other => Err(argument_type(function, "number", other)),
    }
}

fn string<'a>(function: &str, value: &'a Val) -> Result<&'a str, ExpressionErrorKind> {
    match value {
        Val::Str(s) => Ok(s),
        other => Err(argument_type(function, "string", other)),
    }
}

/// Dates arrive either as datetime values or as serialized strings
fn datetime(function: &str, value: &Val) -> Result<NaiveDateTime, ExpressionErrorKind> {
    match value {
        Val::DateTime(dt) => Ok(*dt),
        Val::Str(s) => parse_datetime(s).ok_or_else(|| {
            ExpressionErrorKind::Type(format!("{}() cannot parse '{}' as a date", function, s))
        }),
        other => Err(argument_type(function, "datetime", other)),
    }
}

fn argument_type(function: &str, expected: &str, actual: &Val) -> ExpressionErrorKind {
    ExpressionErrorKind::Type(format!(
        "{}() expects a {}, got {}",
        function,
        expected,
        actual.type_name()
    ))
}

fn midnight(date: NaiveDate) -> Result<NaiveDateTime, ExpressionErrorKind> {
    date.and_hms_opt(0, 0, 0)
        .ok_or_else(|| ExpressionErrorKind::Type(format!("invalid date {}", date)))
}

/* ===================== Implementations ===================== */

fn len(value: &Val) -> CallResult {
    let len = match value {
        Val::Str(s) => s.chars().count(),
        Val::List(items) => items.len(),
        Val::Obj(map) => map.len(),
        other => return Err(argument_type("len", "string, list or object", other)),
    };
    Ok(Val::Num(Decimal::from(len)))
}

fn sum(value: &Val) -> CallResult {
    let Val::List(items) = value else {
        return Err(argument_type("sum", "list", value));
    };
    let mut total = Decimal::ZERO;
    for item in items {
        total = total
            .checked_add(number("sum", item)?)
            .ok_or(ExpressionErrorKind::Overflow)?;
    }
    Ok(Val::Num(total))
}

/// `min(list)` / `min(a, b, ...)` and the `max` counterparts
fn extremum(name: &str, args: &[Val], better: fn(Decimal, Decimal) -> bool) -> CallResult {
    let candidates = match args {
        [Val::List(items)] => items.as_slice(),
        _ => args,
    };
    let mut best: Option<Decimal> = None;
    for candidate in candidates {
        let n = number(name, candidate)?;
        best = match best {
            Some(current) if !better(n, current) => Some(current),
            _ => Some(n),
        };
    }
    best.map(Val::Num).ok_or_else(|| {
        ExpressionErrorKind::Type(format!("{}() of an empty list", name))
    })
}

fn round(args: &[Val]) -> CallResult {
    let value = number("round", &args[0])?;
    let places = match args.get(1) {
        Some(arg) => number("round", arg)?
            .to_u32()
            .ok_or_else(|| ExpressionErrorKind::Type("round() places must be a non-negative integer".to_string()))?,
        None => 0,
    };
    Ok(Val::Num(value.round_dp_with_strategy(
        places,
        RoundingStrategy::MidpointAwayFromZero,
    )))
}

fn contains(haystack: &Val, needle: &Val) -> CallResult {
    match haystack {
        Val::Str(s) => Ok(Val::Bool(s.contains(string("contains", needle)?))),
        Val::List(items) => Ok(Val::Bool(items.contains(needle))),
        Val::Obj(map) => Ok(Val::Bool(map.contains_key(string("contains", needle)?))),
        other => Err(argument_type("contains", "string, list or object", other)),
    }
}

/// `date("2024-01-31")` or `date(2024, 1, 31)`
fn date(args: &[Val]) -> CallResult {
    match args {
        [value] => Ok(Val::DateTime(datetime("date", value)?)),
        [year, month, day] => {
            let part = |v: &Val| number("date", v).map(|n| n.to_i64());
            let (Some(y), Some(m), Some(d)) = (part(year)?, part(month)?, part(day)?) else {
                return Err(ExpressionErrorKind::Type("date() parts must be integers".to_string()));
            };
            let date = i32::try_from(y)
                .ok()
                .zip(u32::try_from(m).ok())
                .zip(u32::try_from(d).ok())
                .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d))
                .ok_or_else(|| ExpressionErrorKind::Type(format!("invalid date {}-{}-{}", y, m, d)))?;
            Ok(Val::DateTime(midnight(date)?))
        }
        _ => Err(ExpressionErrorKind::Arity {
            name: "date".to_string(),
            expected: "1 or 3".to_string(),
            actual: args.len(),
        }),
    }
}
