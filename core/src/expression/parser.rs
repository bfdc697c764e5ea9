//! PEST-based parser for rule expressions
//!
//! Produces the AST consumed by the evaluator in `eval.rs`.

use std::str::FromStr;
use std::sync::OnceLock;

use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest::Parser;
use pest_derive::Parser;
use rust_decimal::Decimal;

use super::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::ExpressionErrorKind;

#[derive(Parser)]
#[grammar = "expression/grammar.pest"]
struct ExpressionParser;

pub type ParseResult<T> = Result<T, ExpressionErrorKind>;

impl From<pest::error::Error<Rule>> for ExpressionErrorKind {
    fn from(err: pest::error::Error<Rule>) -> Self {
        ExpressionErrorKind::Parse(err.to_string())
    }
}

fn pratt() -> &'static PrattParser<Rule> {
    static PRATT: OnceLock<PrattParser<Rule>> = OnceLock::new();
    PRATT.get_or_init(|| {
        PrattParser::new()
            .op(Op::infix(Rule::or, Assoc::Left))
            .op(Op::infix(Rule::and, Assoc::Left))
            .op(Op::infix(Rule::eq, Assoc::Left) | Op::infix(Rule::ne, Assoc::Left))
            .op(Op::infix(Rule::lt, Assoc::Left)
                | Op::infix(Rule::le, Assoc::Left)
                | Op::infix(Rule::gt, Assoc::Left)
                | Op::infix(Rule::ge, Assoc::Left))
            .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
            .op(Op::infix(Rule::mul, Assoc::Left)
                | Op::infix(Rule::div, Assoc::Left)
                | Op::infix(Rule::rem, Assoc::Left))
            .op(Op::prefix(Rule::not) | Op::prefix(Rule::neg))
            .op(Op::postfix(Rule::member) | Op::postfix(Rule::index))
    })
}

/* ===================== Public API ===================== */

/// Parse an expression source string into an AST
pub fn parse(source: &str) -> ParseResult<Expr> {
    let mut pairs = ExpressionParser::parse(Rule::expression, source)?;

    // expression = { SOI ~ expr ~ EOI }
    let expr = pairs
        .next()
        .and_then(|expression| expression.into_inner().next())
        .ok_or_else(|| ExpressionErrorKind::Parse("empty expression".to_string()))?;

    build_expr(expr.into_inner())
}

/* ===================== AST Builder ===================== */

fn build_expr(pairs: Pairs<Rule>) -> ParseResult<Expr> {
    pratt()
        .map_primary(build_primary)
        .map_prefix(|op, operand| {
            let op = match op.as_rule() {
                Rule::not => UnaryOp::Not,
                Rule::neg => UnaryOp::Neg,
                rule => return Err(unexpected(rule)),
            };
            Ok(Expr::Unary {
                op,
                operand: Box::new(operand?),
            })
        })
        .map_postfix(|object, op| {
            let object = Box::new(object?);
            match op.as_rule() {
                Rule::member => {
                    let property = first_inner(op)?.as_str().to_string();
                    Ok(Expr::Member { object, property })
                }
                Rule::index => {
                    let index = build_expr(first_inner(op)?.into_inner())?;
                    Ok(Expr::Index {
                        object,
                        index: Box::new(index),
                    })
                }
                rule => Err(unexpected(rule)),
            }
        })
        .map_infix(|left, op, right| {
            let op = match op.as_rule() {
                Rule::or => BinaryOp::Or,
                Rule::and => BinaryOp::And,
                Rule::eq => BinaryOp::Eq,
                Rule::ne => BinaryOp::Ne,
                Rule::lt => BinaryOp::Lt,
                Rule::le => BinaryOp::Le,
                Rule::gt => BinaryOp::Gt,
                Rule::ge => BinaryOp::Ge,
                Rule::add => BinaryOp::Add,
                Rule::sub => BinaryOp::Sub,
                Rule::mul => BinaryOp::Mul,
                Rule::div => BinaryOp::Div,
                Rule::rem => BinaryOp::Rem,
                rule => return Err(unexpected(rule)),
            };
            Ok(Expr::Binary {
                op,
                left: Box::new(left?),
                right: Box::new(right?),
            })
        })
        .parse(pairs)
}

fn build_primary(pair: Pair<Rule>) -> ParseResult<Expr> {
    match pair.as_rule() {
        Rule::expr => build_expr(pair.into_inner()),
        Rule::null => Ok(Expr::LitNull),
        Rule::boolean => Ok(Expr::LitBool {
            v: pair.as_str() == "true",
        }),
        Rule::number => Ok(Expr::LitNum {
            v: parse_number(pair.as_str())?,
        }),
        Rule::string => {
            let inner = first_inner(pair)?;
            Ok(Expr::LitStr {
                v: unescape(inner.as_str()),
            })
        }
        Rule::identifier => Ok(Expr::Ident {
            name: pair.as_str().to_string(),
        }),
        Rule::call => {
            let mut inner = pair.into_inner();
            let function = inner
                .next()
                .ok_or_else(|| ExpressionErrorKind::Parse("call without a function name".to_string()))?
                .as_str()
                .to_string();
            let args = inner
                .map(|arg| build_expr(arg.into_inner()))
                .collect::<ParseResult<Vec<_>>>()?;
            Ok(Expr::Call { function, args })
        }
        rule => Err(unexpected(rule)),
    }
}

fn first_inner(pair: Pair<Rule>) -> ParseResult<Pair<Rule>> {
    let rule = pair.as_rule();
    pair.into_inner()
        .next()
        .ok_or_else(|| ExpressionErrorKind::Parse(format!("{:?} is missing its operand", rule)))
}

fn unexpected(rule: Rule) -> ExpressionErrorKind {
    ExpressionErrorKind::Parse(format!("unexpected token: {:?}", rule))
}

/// Parse a numeric literal into an exact decimal.
///
/// Accepts an optional exponent and an optional `m` suffix (`5.70m`).
pub(crate) fn parse_number(text: &str) -> ParseResult<Decimal> {
    let digits = text.trim_end_matches(['m', 'M']);
    let parsed = if digits.contains(['e', 'E']) {
        Decimal::from_scientific(digits)
    } else {
        Decimal::from_str(digits)
    };
    parsed.map_err(|_| ExpressionErrorKind::Parse(format!("invalid number: {}", text)))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
