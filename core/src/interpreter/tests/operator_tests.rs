//! Tests for binary operators (||, &&, ==, !=, <, <=, >, >=, +, -, *, /, %, ^)

use std::collections::BTreeMap;

use maplit::btreemap;

use crate::interpreter::{evaluate, BinaryOp, EvalError, Side};
use crate::value::{Function, Number, Type, Value};

fn eval(lhs: Value, op: BinaryOp, rhs: Value) -> Value {
    evaluate(&lhs, op, &rhs).expect("evaluation failed")
}

fn eval_err(lhs: Value, op: BinaryOp, rhs: Value) -> EvalError {
    evaluate(&lhs, op, &rhs).expect_err("evaluation should fail")
}

fn number(value: Value) -> Number {
    value.as_number().expect("expected a number")
}

/* ===================== Equality ===================== */

#[test]
fn test_equality_is_reflexive() {
    let values = vec![
        Value::Null,
        Value::int(-3),
        Value::uint(7),
        Value::float(1.5),
        Value::from("text"),
        Value::Bool(false),
        Value::Array(vec![Value::int(1), Value::from("a")]),
        Value::Object(btreemap! { "k".to_string() => Value::Bool(true) }),
        Value::encapsulate(42_u32),
    ];

    for value in values {
        assert_eq!(eval(value.clone(), BinaryOp::Eq, value.clone()), Value::Bool(true));
        assert_eq!(eval(value.clone(), BinaryOp::Neq, value), Value::Bool(false));
    }
}

#[test]
fn test_different_types_are_never_equal() {
    assert_eq!(eval(Value::int(1), BinaryOp::Eq, Value::from("1")), Value::Bool(false));
    assert_eq!(eval(Value::Null, BinaryOp::Eq, Value::Bool(false)), Value::Bool(false));
    assert_eq!(eval(Value::int(0), BinaryOp::Neq, Value::Null), Value::Bool(true));
}

#[test]
fn test_number_equality_promotes_kinds() {
    assert_eq!(eval(Value::int(3), BinaryOp::Eq, Value::float(3.0)), Value::Bool(true));
    assert_eq!(eval(Value::uint(3), BinaryOp::Eq, Value::int(3)), Value::Bool(true));
    assert_eq!(eval(Value::uint(3), BinaryOp::Eq, Value::float(3.5)), Value::Bool(false));
}

#[test]
fn test_array_equality_is_order_sensitive() {
    let a = Value::Array(vec![Value::int(1), Value::int(2)]);
    let b = Value::Array(vec![Value::int(2), Value::int(1)]);
    let shorter = Value::Array(vec![Value::int(1)]);
    assert_eq!(eval(a.clone(), BinaryOp::Eq, b), Value::Bool(false));
    assert_eq!(eval(a, BinaryOp::Eq, shorter), Value::Bool(false));
}

#[test]
fn test_object_equality_ignores_key_order() {
    let mut a = BTreeMap::new();
    a.insert("x".to_string(), Value::int(1));
    a.insert("y".to_string(), Value::from("two"));
    let b = btreemap! {
        "y".to_string() => Value::from("two"),
        "x".to_string() => Value::float(1.0),
    };
    assert_eq!(eval(Value::Object(a.clone()), BinaryOp::Eq, Value::Object(b)), Value::Bool(true));

    let missing = btreemap! { "x".to_string() => Value::int(1) };
    assert_eq!(eval(Value::Object(a), BinaryOp::Eq, Value::Object(missing)), Value::Bool(false));
}

#[test]
fn test_functions_are_never_equal() {
    let f = Value::Function(Function::new("identity", |args| Ok(args[0].clone())));
    assert_eq!(eval(f.clone(), BinaryOp::Eq, f.clone()), Value::Bool(false));
    assert_eq!(eval(f.clone(), BinaryOp::Neq, f), Value::Bool(true));
}

#[test]
fn test_capsules_compare_deeply() {
    #[derive(Debug, PartialEq)]
    struct Handle {
        id: u32,
        tags: Vec<String>,
    }

    let a = Value::encapsulate(Handle { id: 1, tags: vec!["x".into()] });
    let b = Value::encapsulate(Handle { id: 1, tags: vec!["x".into()] });
    let c = Value::encapsulate(Handle { id: 2, tags: vec![] });
    assert_eq!(eval(a.clone(), BinaryOp::Eq, b), Value::Bool(true));
    assert_eq!(eval(a.clone(), BinaryOp::Eq, c), Value::Bool(false));
    assert_eq!(eval(a, BinaryOp::Eq, Value::encapsulate(1_u32)), Value::Bool(false));
}

/* ===================== Arithmetic Operators ===================== */

#[test]
fn test_add_int_and_float_yields_float() {
    let result = number(eval(Value::int(3), BinaryOp::Add, Value::float(5.0)));
    assert!(matches!(result, Number::Float(v) if v == 8.0));
}

#[test]
fn test_add_uint_and_int_yields_int() {
    let result = number(eval(Value::uint(2), BinaryOp::Add, Value::int(-5)));
    assert!(matches!(result, Number::Int(-3)));
}

#[test]
fn test_add_strings_concatenates() {
    assert_eq!(eval(Value::from("foo"), BinaryOp::Add, Value::from("bar")), Value::from("foobar"));
}

#[test]
fn test_integer_arithmetic_wraps() {
    let result = number(eval(Value::uint(1), BinaryOp::Sub, Value::uint(2)));
    assert!(matches!(result, Number::Uint(u64::MAX)));

    let result = number(eval(Value::int(i64::MAX), BinaryOp::Add, Value::int(1)));
    assert!(matches!(result, Number::Int(i64::MIN)));

    let result = number(eval(Value::int(i64::MIN), BinaryOp::Div, Value::int(-1)));
    assert!(matches!(result, Number::Int(i64::MIN)));
}

#[test]
fn test_mul_and_sub() {
    assert_eq!(eval(Value::int(6), BinaryOp::Mul, Value::int(7)), Value::int(42));
    assert_eq!(eval(Value::float(2.5), BinaryOp::Sub, Value::int(1)), Value::float(1.5));
}

#[test]
fn test_div_truncates_integers() {
    let result = number(eval(Value::int(7), BinaryOp::Div, Value::int(2)));
    assert!(matches!(result, Number::Int(3)));
    assert_eq!(eval(Value::float(7.0), BinaryOp::Div, Value::int(2)), Value::float(3.5));
}

#[test]
fn test_mod() {
    assert_eq!(eval(Value::int(7), BinaryOp::Mod, Value::int(3)), Value::int(1));
    assert_eq!(eval(Value::uint(7), BinaryOp::Mod, Value::uint(4)), Value::uint(3));
    assert_eq!(eval(Value::float(7.5), BinaryOp::Mod, Value::int(2)), Value::float(1.5));
}

#[test]
fn test_divide_by_zero_of_any_kind() {
    for zero in [Value::int(0), Value::uint(0), Value::float(0.0)] {
        for op in [BinaryOp::Div, BinaryOp::Mod] {
            match eval_err(Value::int(10), op, zero.clone()) {
                EvalError::DivideByZero { value } => assert_eq!(value, zero),
                other => panic!("Expected divide by zero, got {:?}", other),
            }
        }
    }
}

#[test]
fn test_divide_by_zero_message() {
    let err = eval_err(Value::float(1.0), BinaryOp::Div, Value::uint(0));
    assert!(err.to_string().contains("divide by zero"));
}

#[test]
fn test_pow_integers() {
    assert_eq!(eval(Value::int(2), BinaryOp::Pow, Value::int(10)), Value::int(1024));
    assert_eq!(eval(Value::uint(3), BinaryOp::Pow, Value::uint(4)), Value::uint(81));
    assert_eq!(eval(Value::int(-2), BinaryOp::Pow, Value::int(3)), Value::int(-8));
}

#[test]
fn test_pow_identities() {
    for n in [-5, 0, 1, 9] {
        assert_eq!(eval(Value::int(n), BinaryOp::Pow, Value::int(0)), Value::int(1));
    }
    for m in [0, 1, 7, 1_000_000] {
        assert_eq!(eval(Value::int(1), BinaryOp::Pow, Value::int(m)), Value::int(1));
    }
    for m in [1, 2, 63] {
        assert_eq!(eval(Value::uint(0), BinaryOp::Pow, Value::uint(m)), Value::uint(0));
    }
}

#[test]
fn test_pow_wraps_and_handles_negative_exponent() {
    assert_eq!(eval(Value::uint(2), BinaryOp::Pow, Value::uint(64)), Value::uint(0));
    assert_eq!(eval(Value::int(2), BinaryOp::Pow, Value::int(-1)), Value::int(2));
}

#[test]
fn test_pow_floats() {
    assert_eq!(eval(Value::float(2.0), BinaryOp::Pow, Value::float(3.0)), Value::float(8.0));
    assert_eq!(eval(Value::int(2), BinaryOp::Pow, Value::float(-1.0)), Value::float(0.5));
}

/* ===================== Comparison Operators ===================== */

#[test]
fn test_string_less_than() {
    assert_eq!(eval(Value::from("a"), BinaryOp::Lt, Value::from("b")), Value::Bool(true));
    assert_eq!(eval(Value::from("b"), BinaryOp::Lte, Value::from("a")), Value::Bool(false));
    assert_eq!(eval(Value::from("abc"), BinaryOp::Gte, Value::from("abc")), Value::Bool(true));
}

#[test]
fn test_number_comparisons_promote() {
    assert_eq!(eval(Value::uint(3), BinaryOp::Gt, Value::int(-1)), Value::Bool(true));
    assert_eq!(eval(Value::int(2), BinaryOp::Lt, Value::float(2.5)), Value::Bool(true));
    assert_eq!(eval(Value::float(2.0), BinaryOp::Lte, Value::uint(2)), Value::Bool(true));
    assert_eq!(eval(Value::int(5), BinaryOp::Gte, Value::int(6)), Value::Bool(false));
}

#[test]
fn test_nan_comparisons_are_false() {
    let nan = Value::float(f64::NAN);
    assert_eq!(eval(nan.clone(), BinaryOp::Lt, Value::int(1)), Value::Bool(false));
    assert_eq!(eval(nan, BinaryOp::Gte, Value::int(1)), Value::Bool(false));
}

/* ===================== Logical Operators ===================== */

#[test]
fn test_logical_operators() {
    assert_eq!(eval(Value::Bool(true), BinaryOp::And, Value::Bool(false)), Value::Bool(false));
    assert_eq!(eval(Value::Bool(true), BinaryOp::Or, Value::Bool(false)), Value::Bool(true));
    assert_eq!(eval(Value::Bool(false), BinaryOp::Or, Value::Bool(false)), Value::Bool(false));
}

/* ===================== Type Errors ===================== */

#[test]
fn test_unsupported_lhs_type() {
    match eval_err(Value::Bool(true), BinaryOp::Add, Value::int(1)) {
        EvalError::UnsupportedType {
            side,
            value,
            op,
            actual,
            ..
        } => {
            assert_eq!(side, Side::Lhs);
            assert_eq!(value, Value::Bool(true));
            assert_eq!(op, BinaryOp::Add);
            assert_eq!(actual, Type::Bool);
        }
        other => panic!("Expected unsupported type, got {:?}", other),
    }
}

#[test]
fn test_unsupported_rhs_type() {
    let err = eval_err(Value::int(1), BinaryOp::Sub, Value::from("x"));
    assert!(matches!(err, EvalError::UnsupportedType { side: Side::Rhs, .. }));
    assert_eq!(
        err.to_string(),
        r#"right operand "x": should be one of [number] for binop -, got string"#
    );
}

#[test]
fn test_unsupported_type_lists_allowed_set() {
    let err = eval_err(Value::Null, BinaryOp::Add, Value::Null);
    assert!(err
        .to_string()
        .contains("should be one of [number, string, capsule] for binop +, got null"));
}

#[test]
fn test_logical_operators_reject_numbers() {
    let err = eval_err(Value::int(1), BinaryOp::And, Value::Bool(true));
    assert!(matches!(err, EvalError::UnsupportedType { side: Side::Lhs, .. }));
}

#[test]
fn test_mismatched_accepted_types() {
    match eval_err(Value::int(1), BinaryOp::Add, Value::from("a")) {
        EvalError::TypeMismatch {
            value,
            expected,
            actual,
        } => {
            assert_eq!(value, Value::from("a"));
            assert_eq!(expected, Type::Number);
            assert_eq!(actual, Type::String);
        }
        other => panic!("Expected type mismatch, got {:?}", other),
    }
}

#[test]
fn test_comparison_rejects_arrays() {
    let list = Value::Array(vec![]);
    let err = eval_err(list.clone(), BinaryOp::Lt, list);
    assert!(matches!(err, EvalError::UnsupportedType { actual: Type::Array, .. }));
}
