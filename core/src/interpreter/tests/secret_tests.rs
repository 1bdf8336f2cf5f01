//! Tests for secret capsules flowing through binary operators

use crate::interpreter::{evaluate, BinaryOp, EvalError, Side};
use crate::secrets::{OptionalSecret, Secret};
use crate::value::{Type, Value};

fn add(lhs: Value, rhs: Value) -> Value {
    evaluate(&lhs, BinaryOp::Add, &rhs).expect("addition failed")
}

fn as_secret(value: &Value) -> &Secret {
    value
        .as_capsule()
        .and_then(|capsule| capsule.downcast_ref::<Secret>())
        .unwrap_or_else(|| panic!("Expected secret, got {:?}", value))
}

fn as_optional(value: &Value) -> &OptionalSecret {
    value
        .as_capsule()
        .and_then(|capsule| capsule.downcast_ref::<OptionalSecret>())
        .unwrap_or_else(|| panic!("Expected optional secret, got {:?}", value))
}

/* ===================== Secret ===================== */

#[test]
fn test_secret_plus_secret() {
    let result = add(Secret::new("foo").into(), Secret::new("bar").into());
    assert_eq!(as_secret(&result).expose(), "foobar");
}

#[test]
fn test_secret_plus_string_stays_secret() {
    let result = add(Secret::new("user:").into(), Value::from("pass"));
    assert_eq!(as_secret(&result).expose(), "user:pass");

    let result = add(Value::from("user:"), Secret::new("pass").into());
    assert_eq!(as_secret(&result).expose(), "user:pass");
}

#[test]
fn test_secret_plus_optional_secret_becomes_secret() {
    let result = add(Secret::new("a").into(), OptionalSecret::public("b").into());
    assert_eq!(as_secret(&result).expose(), "ab");

    let result = add(OptionalSecret::public("a").into(), Secret::new("b").into());
    assert_eq!(as_secret(&result).expose(), "ab");
}

/* ===================== OptionalSecret ===================== */

#[test]
fn test_public_optional_secret_degrades_to_string() {
    let result = add(OptionalSecret::public("host:").into(), Value::from("8080"));
    assert_eq!(result, Value::from("host:8080"));

    let result = add(Value::from("host:"), OptionalSecret::public("8080").into());
    assert_eq!(result, Value::from("host:8080"));
}

#[test]
fn test_sensitive_optional_secret_spreads_to_string() {
    let result = add(OptionalSecret::secret("token-").into(), Value::from("suffix"));
    let optional = as_optional(&result);
    assert_eq!(optional.value, "token-suffix");
    assert!(optional.is_secret);

    let result = add(Value::from("prefix-"), OptionalSecret::secret("token").into());
    let optional = as_optional(&result);
    assert_eq!(optional.value, "prefix-token");
    assert!(optional.is_secret);
}

#[test]
fn test_optional_secrets_combine_secrecy() {
    let result = add(OptionalSecret::public("a").into(), OptionalSecret::secret("b").into());
    let optional = as_optional(&result);
    assert_eq!(optional.value, "ab");
    assert!(optional.is_secret);

    let result = add(OptionalSecret::public("a").into(), OptionalSecret::public("b").into());
    assert!(!as_optional(&result).is_secret);
}

#[test]
fn test_result_display_stays_redacted() {
    let result = add(Value::from("password="), Secret::new("hunter2").into());
    assert!(!result.to_string().contains("hunter2"));
}

/* ===================== Comparison and Errors ===================== */

#[test]
fn test_public_optional_secret_compares_as_string() {
    let lhs: Value = OptionalSecret::public("a").into();
    let result = evaluate(&lhs, BinaryOp::Lt, &Value::from("b")).unwrap();
    assert_eq!(result, Value::Bool(true));
}

#[test]
fn test_secret_comparison_is_rejected() {
    let lhs: Value = Secret::new("a").into();
    let err = evaluate(&lhs, BinaryOp::Lt, &Value::from("b")).unwrap_err();
    match err {
        EvalError::UnsupportedType {
            side, value, actual, ..
        } => {
            assert_eq!(side, Side::Lhs);
            assert_eq!(value, lhs);
            assert_eq!(actual, Type::Capsule);
        }
        other => panic!("Expected unsupported type, got {:?}", other),
    }
}

#[test]
fn test_secret_equality_is_not_coerced() {
    let secret: Value = Secret::new("a").into();
    let result = evaluate(&secret, BinaryOp::Eq, &Value::from("a")).unwrap();
    assert_eq!(result, Value::Bool(false));

    let result = evaluate(&secret, BinaryOp::Eq, &Secret::new("a").into()).unwrap();
    assert_eq!(result, Value::Bool(true));
}

#[test]
fn test_unknown_capsules_cannot_be_added() {
    let lhs = Value::encapsulate(1_u8);
    let rhs = Value::encapsulate(2_u8);
    let err = evaluate(&lhs, BinaryOp::Add, &rhs).unwrap_err();
    assert!(matches!(err, EvalError::UnknownCapsule { op: BinaryOp::Add, .. }));
}

#[test]
fn test_unknown_capsule_plus_string_is_mismatch() {
    let lhs = Value::encapsulate(1_u8);
    let err = evaluate(&lhs, BinaryOp::Add, &Value::from("x")).unwrap_err();
    assert!(matches!(
        err,
        EvalError::TypeMismatch {
            expected: Type::Capsule,
            actual: Type::String,
            ..
        }
    ));
}

#[test]
fn test_secret_plus_number_is_mismatch() {
    let lhs: Value = Secret::new("a").into();
    let err = evaluate(&lhs, BinaryOp::Add, &Value::int(1)).unwrap_err();
    assert!(matches!(err, EvalError::TypeMismatch { .. }));
}
