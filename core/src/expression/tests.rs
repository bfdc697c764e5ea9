//! Expression tests - parsing, validation and evaluation
//!
//! Parser tests check AST shape; evaluation tests run expressions against JSON inputs
//! through the public `ExpressionEvaluator` contract.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::{parser, ExpressionEvaluator, Interpreter, Val};
use crate::error::ExpressionErrorKind;

fn eval(expression: &str, input: serde_json::Value) -> Result<bool, ExpressionErrorKind> {
    Interpreter::new()
        .evaluate(expression, &input)
        .map_err(|err| err.kind)
}

fn value(expression: &str, input: serde_json::Value) -> Val {
    Interpreter::new()
        .evaluate_value(expression, &input)
        .expect("expression should evaluate")
}

fn num(text: &str) -> Val {
    Val::Num(text.parse::<Decimal>().expect("valid decimal"))
}

/* ===================== Parsing ===================== */

#[test]
fn test_parse_member_comparison() {
    let ast = parser::parse("input.SomeNumber == 1").expect("Should parse");

    match ast {
        Expr::Binary {
            op: BinaryOp::Eq,
            left,
            right,
        } => {
            assert_eq!(
                *left,
                Expr::Member {
                    object: Box::new(Expr::Ident {
                        name: "input".to_string()
                    }),
                    property: "SomeNumber".to_string(),
                }
            );
            assert_eq!(*right, Expr::LitNum { v: Decimal::ONE });
        }
        _ => panic!("Expected Binary Eq, got {:?}", ast),
    }
}

#[test]
fn test_parse_precedence() {
    // a || b && c  parses as  a || (b && c)
    let ast = parser::parse("true || false && false").expect("Should parse");
    let Expr::Binary { op: BinaryOp::Or, right, .. } = ast else {
        panic!("Expected Or at the root, got {:?}", ast);
    };
    assert!(matches!(*right, Expr::Binary { op: BinaryOp::And, .. }));

    // 1 + 2 * 3  parses as  1 + (2 * 3)
    let ast = parser::parse("1 + 2 * 3 == 7").expect("Should parse");
    let Expr::Binary { op: BinaryOp::Eq, left, .. } = ast else {
        panic!("Expected Eq at the root, got {:?}", ast);
    };
    let Expr::Binary { op: BinaryOp::Add, right, .. } = *left else {
        panic!("Expected Add under Eq");
    };
    assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
}

#[test]
fn test_parse_prefix_binds_after_member_access() {
    let ast = parser::parse("!input.flag").expect("Should parse");
    let Expr::Unary { op: UnaryOp::Not, operand } = ast else {
        panic!("Expected Not at the root, got {:?}", ast);
    };
    assert!(matches!(*operand, Expr::Member { .. }));
}

#[test]
fn test_parse_literals() {
    assert_eq!(parser::parse("null").unwrap(), Expr::LitNull);
    assert_eq!(parser::parse("false").unwrap(), Expr::LitBool { v: false });
    assert_eq!(
        parser::parse("5.70m").unwrap(),
        Expr::LitNum { v: "5.70".parse().unwrap() }
    );
    assert_eq!(
        parser::parse("1.5e3").unwrap(),
        Expr::LitNum { v: Decimal::from(1500) }
    );
    assert_eq!(
        parser::parse(r#""say \"hi\"\n""#).unwrap(),
        Expr::LitStr { v: "say \"hi\"\n".to_string() }
    );
    assert_eq!(
        parser::parse("'single'").unwrap(),
        Expr::LitStr { v: "single".to_string() }
    );
}

#[test]
fn test_parse_keyword_prefixed_identifier() {
    let ast = parser::parse("input.trueValue").expect("Should parse");
    assert!(matches!(ast, Expr::Member { ref property, .. } if property == "trueValue"));
}

#[test]
fn test_parse_call_and_index() {
    let ast = parser::parse("len(input.items[0].tags) > 1").expect("Should parse");
    let Expr::Binary { left, .. } = ast else {
        panic!("Expected Binary");
    };
    let Expr::Call { function, args } = *left else {
        panic!("Expected Call");
    };
    assert_eq!(function, "len");
    assert_eq!(args.len(), 1);
    assert!(matches!(args[0], Expr::Member { .. }));
}

#[test]
fn test_parse_errors() {
    for source in ["", "input.", "input.SomeNumber ==", "(1 + 2", "1 +* 2", "input..x", "5x"] {
        let result = parser::parse(source);
        assert!(
            matches!(result, Err(ExpressionErrorKind::Parse(_))),
            "expected parse error for {:?}, got {:?}",
            source,
            result
        );
    }
}

/* ===================== Evaluation ===================== */

#[test]
fn test_member_equality() {
    assert_eq!(eval("input.SomeNumber == 1", json!({"SomeNumber": 1})), Ok(true));
    assert_eq!(eval("input.SomeNumber == 1", json!({"SomeNumber": 2})), Ok(false));
    assert_eq!(
        eval(r#"input.SomeString == "Test""#, json!({"SomeString": "Test"})),
        Ok(true)
    );
}

#[test]
fn test_simple_inputs() {
    assert_eq!(eval(r#"input == "1""#, json!("1")), Ok(true));
    assert_eq!(eval("input == 1", json!(1)), Ok(true));
    assert_eq!(eval(r#"input == "1""#, json!("abc")), Ok(false));
}

#[test]
fn test_decimal_comparisons_are_exact() {
    assert_eq!(eval("input.total == 5.70", json!({"total": 5.7})), Ok(true));
    assert_eq!(eval("0.1 + 0.2 == 0.3", json!(null)), Ok(true));
    assert_eq!(value("input.total / 100 * 15", json!({"total": 5.7})), num("0.855"));
}

#[test]
fn test_arithmetic() {
    assert_eq!(value("7 % 3", json!(null)), num("1"));
    assert_eq!(value("-input.x + 2", json!({"x": 5})), num("-3"));
    assert_eq!(value(r#""n=" + 3"#, json!(null)), Val::Str("n=3".to_string()));
    assert_eq!(
        eval("1 / 0 == 1", json!(null)),
        Err(ExpressionErrorKind::DivisionByZero)
    );
}

#[test]
fn test_logical_short_circuit() {
    // The right side would fail with a missing member if evaluated
    assert_eq!(eval("false && input.missing", json!({})), Ok(false));
    assert_eq!(eval("true || input.missing", json!({})), Ok(true));
    assert_eq!(
        eval("true && input.missing", json!({})),
        Err(ExpressionErrorKind::MissingMember("missing".to_string()))
    );
}

#[test]
fn test_comparisons() {
    let input = json!({"age": 30, "name": "bob"});
    assert_eq!(eval("input.age >= 30 && input.age < 31", input.clone()), Ok(true));
    assert_eq!(eval("input.age != 30", input.clone()), Ok(false));
    assert_eq!(eval(r#"input.name < "carol""#, input.clone()), Ok(true));
    assert_eq!(eval("input.nickname == null", json!({"nickname": null})), Ok(true));
    assert_eq!(eval("input.age == null", input), Ok(false));
}

#[test]
fn test_nested_members_and_indexes() {
    let input = json!({
        "order": {"lines": [{"sku": "A", "qty": 2}, {"sku": "B", "qty": 5}]},
        "tags": {"vip": true}
    });
    assert_eq!(eval("input.order.lines[1].qty == 5", input.clone()), Ok(true));
    assert_eq!(eval(r#"input.order.lines[-1].sku == "B""#, input.clone()), Ok(true));
    assert_eq!(eval(r#"input.tags["vip"]"#, input.clone()), Ok(true));
    assert_eq!(
        eval("input.order.lines[2].qty == 5", input),
        Err(ExpressionErrorKind::IndexOutOfBounds { index: 2, len: 2 })
    );
}

#[test]
fn test_functions() {
    let input = json!({"prices": [1.20, 2.50, 2.00], "name": "Widget"});
    assert_eq!(eval("sum(input.prices) == 5.70", input.clone()), Ok(true));
    assert_eq!(eval("len(input.prices) == 3", input.clone()), Ok(true));
    assert_eq!(eval("max(input.prices) == 2.5 && min(1, 4, -2) == -2", input.clone()), Ok(true));
    assert_eq!(eval(r#"contains(input.prices, 2) && contains(input.name, "dg")"#, input.clone()), Ok(true));
    assert_eq!(eval(r#"lower(input.name) == "widget" && starts_with(input.name, "Wid")"#, input.clone()), Ok(true));
    assert_eq!(eval("round(2.345, 2) == 2.35 && abs(-3) == 3", input), Ok(true));
}

#[test]
fn test_dates() {
    let input = json!({"birthday": "2001-03-04", "joined": "2020-01-01T10:30:00Z"});
    assert_eq!(eval(r#"input.birthday >= date("2000-01-01")"#, input.clone()), Ok(true));
    assert_eq!(eval("input.birthday == date(2001, 3, 4)", input.clone()), Ok(true));
    assert_eq!(eval("year(input.joined) == 2020 && month(input.birthday) == 3", input.clone()), Ok(true));
    assert_eq!(eval(r#"days_between(input.birthday, "2001-03-14") == 10"#, input.clone()), Ok(true));
    assert_eq!(eval("input.joined < now()", input), Ok(true));
}

#[test]
fn test_unread_numbers_are_never_converted() {
    let input = json!({"SomeNumber": 1, "Tiny": 1e-30, "Huge": 1e300, "nested": {"far": [1e300]}});
    assert_eq!(eval("input.SomeNumber == 1", input.clone()), Ok(true));
    assert_eq!(eval(r#"input["SomeNumber"] == 1 && input.nested.far != null"#, json!({"nested": {"far": []}, "SomeNumber": 1, "Tiny": 1e-30})), Ok(true));

    let result = eval("input.Tiny > 0", input.clone());
    assert!(matches!(result, Err(ExpressionErrorKind::InputConversion(_))), "got {:?}", result);

    let result = eval("input.nested.far[0] > 0", input);
    assert!(matches!(result, Err(ExpressionErrorKind::InputConversion(_))), "got {:?}", result);
}

#[test]
fn test_string_indexing() {
    let input = json!({"code": "AB-9"});
    assert_eq!(eval(r#"input.code[0] == "A" && input.code[-1] == "9""#, input.clone()), Ok(true));
    assert_eq!(
        eval(r#"input.code[4] == "x""#, input),
        Err(ExpressionErrorKind::IndexOutOfBounds { index: 4, len: 4 })
    );
}

#[test]
fn test_member_of_scalar_is_a_type_error() {
    let result = eval("input.SomeNumber.digits == 1", json!({"SomeNumber": 1}));
    assert!(matches!(result, Err(ExpressionErrorKind::Type(_))), "got {:?}", result);
}

/* ===================== Errors ===================== */

#[test]
fn test_missing_member_is_an_error() {
    assert_eq!(
        eval("input.Other == 1", json!({"SomeNumber": 1})),
        Err(ExpressionErrorKind::MissingMember("Other".to_string()))
    );
}

#[test]
fn test_non_boolean_result_is_an_error() {
    assert_eq!(
        eval("input.SomeNumber + 1", json!({"SomeNumber": 1})),
        Err(ExpressionErrorKind::NotBoolean("number".to_string()))
    );
}

#[test]
fn test_type_mismatch_is_an_error() {
    let result = eval(r#"input == 1"#, json!("abc"));
    assert!(matches!(result, Err(ExpressionErrorKind::Type(_))), "got {:?}", result);

    let result = eval("input.flag && 1", json!({"flag": true}));
    assert!(matches!(result, Err(ExpressionErrorKind::Type(_))), "got {:?}", result);
}

#[test]
fn test_unknown_identifier_and_function() {
    assert_eq!(
        eval("other.SomeNumber == 1", json!({})),
        Err(ExpressionErrorKind::UnknownIdentifier("other".to_string()))
    );
    assert_eq!(
        eval("explode(input)", json!({})),
        Err(ExpressionErrorKind::UnknownFunction("explode".to_string()))
    );
    assert!(matches!(
        eval("len(input, input) == 1", json!({})),
        Err(ExpressionErrorKind::Arity { actual: 2, .. })
    ));
}

#[test]
fn test_error_carries_expression_text() {
    let err = Interpreter::new()
        .evaluate("input.SomeNumber ==", &json!({}))
        .unwrap_err();
    assert_eq!(err.expression, "input.SomeNumber ==");
    assert!(matches!(err.kind, ExpressionErrorKind::Parse(_)));
    assert!(err.to_string().contains("input.SomeNumber =="));
}

/* ===================== Bindings and typed inputs ===================== */

#[test]
fn test_custom_binding() {
    let interpreter = Interpreter::with_binding("order");
    assert_eq!(interpreter.evaluate("order.total > 10", &json!({"total": 11})), Ok(true));
    assert!(interpreter.check("input.total > 10").is_err());
}

#[test]
fn test_typed_input() {
    #[derive(Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Envelope {
        some_integer: i32,
        some_string: String,
    }

    let input = Envelope {
        some_integer: 1,
        some_string: "Test".to_string(),
    };
    let interpreter = Interpreter::new();
    assert_eq!(interpreter.evaluate("input.SomeInteger == 1", &input), Ok(true));
    assert_eq!(
        interpreter.evaluate(r#"input.SomeString == "Test""#, &input),
        Ok(true)
    );
}

#[test]
fn test_compiled_expression_reuse() {
    let compiled = Interpreter::new()
        .compile("input > 2")
        .expect("Should compile");
    assert_eq!(compiled.source(), "input > 2");
    assert_eq!(compiled.evaluate_bool(&json!(3)), Ok(true));
    assert_eq!(compiled.evaluate_bool(&json!(1)), Ok(false));
}
