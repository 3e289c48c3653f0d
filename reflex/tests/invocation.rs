//! Invocation handles and zero-value fallbacks.

mod common;

use common::{base_ty, main_ty};
use pretty_assertions::assert_eq;
use reflex::{InvocationError, RuleSet, Value};

#[test]
fn test_typed_accessor_reads_result() {
    let (finder, _sink) = common::finder();
    let rules = RuleSet::new(|r| {
        r.name("count");
        r.empty_param();
    });

    let result = finder.find(&main_ty(), &rules);
    assert_eq!(result.get(None).int(&[]), 5);
    assert_eq!(result.get(None).invoke::<i32>(&[]), Some(5));
}

#[test]
fn test_int_accessor_returns_zero_on_invocation_error() {
    let (finder, _sink) = common::finder();
    let count = RuleSet::new(|r| {
        r.name("count");
    });
    let fail = RuleSet::new(|r| {
        r.name("fail");
    });

    // Wrong argument count
    let handle = finder.find(&main_ty(), &count).get(None);
    assert!(matches!(
        handle.call(&[Value::Int(1)]),
        Err(InvocationError::ArgumentMismatch { expected: 0, actual: 1 })
    ));
    assert_eq!(handle.int(&[Value::Int(1)]), 0);

    // The member body itself fails
    let handle = finder.find(&main_ty(), &fail).get(None);
    assert!(matches!(handle.call(&[]), Err(InvocationError::Reflective { .. })));
    assert_eq!(handle.int(&[]), 0);
    assert_eq!(handle.long(&[]), 0);
    assert_eq!(handle.string(&[]), "");
    assert!(!handle.boolean(&[]));
}

#[test]
fn test_type_mismatch_returns_zero_value() {
    let (finder, _sink) = common::finder();
    let rules = RuleSet::new(|r| {
        r.name("getTitle");
    });

    let handle = finder.find(&base_ty(), &rules).get(None);
    assert_eq!(handle.string(&[]), "Main");
    assert_eq!(handle.int(&[]), 0);
    assert_eq!(handle.double(&[]), 0.0);
    assert_eq!(handle.char(&[]), ' ');
    assert_eq!(handle.byte(&[]), None);
}

#[test]
fn test_handle_from_failed_result() {
    let (finder, _sink) = common::finder();
    let rules = RuleSet::new(|r| {
        r.name("missing");
    });

    let result = finder.find(&main_ty(), &rules).ignored();
    let handle = result.get(None);
    assert_eq!(handle.call(&[]), Err(InvocationError::NoMember));
    assert_eq!(handle.int(&[]), 0);
    assert!(result.all(None).is_empty());
}

#[test]
fn test_all_handles_follow_result_order() {
    let (finder, _sink) = common::finder();
    let rules = RuleSet::new(|r| {
        r.return_type("int");
    });

    let result = finder.find(&main_ty(), &rules);
    let handles = result.all(None);
    let names: Vec<_> = handles
        .iter()
        .filter_map(|h| h.member().map(|m| m.name.clone()))
        .collect();
    assert_eq!(names, vec!["count", "fail"]);
    assert_eq!(handles[0].int(&[]), 5);
    assert_eq!(handles[1].int(&[]), 0);
}
