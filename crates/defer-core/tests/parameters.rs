//! Captura de globales y parámetros explícitos.

use defer_adapters::tasks::{rotate, sum};
use defer_core::{
    call_args, construct, param, Bound, ConstructEngine, ConstructError, Environment, RawValue,
    Reference, ValueType,
};

#[test]
fn typed_globals_become_parameters_and_implicit_arguments() {
    let engine = ConstructEngine::builder()
        .environment(Environment::new().typed("INPUT_NUM", ValueType::Int, 3))
        .build();
    let workflow = engine.construct(rotate().call(call_args! { num: 3 })).unwrap();

    let parameter = workflow.parameters().get("INPUT_NUM").expect("parameter");
    assert_eq!(parameter.typ(), &ValueType::Int);
    assert_eq!(parameter.default(), Some(&RawValue::Int(3)));

    let step = workflow.steps()[0].step();
    match step.arguments().get("INPUT_NUM") {
        Some(Bound::Reference(Reference::Parameter { name, .. })) => {
            assert_eq!(name, "INPUT_NUM");
        }
        other => panic!("expected an implicit parameter argument, got {other:?}"),
    }
    assert!(workflow.find_parameters().contains_key("INPUT_NUM"));
}

#[test]
fn untyped_globals_fail_naming_variable_and_task() {
    let engine = ConstructEngine::builder()
        .environment(Environment::new().untyped("INPUT_NUM", 3))
        .build();
    let err = engine.construct(rotate().call(call_args! { num: 3 })).unwrap_err();
    match err {
        ConstructError::UnresolvableVariable { task, variable } => {
            assert_eq!(task, "rotate");
            assert_eq!(variable, "INPUT_NUM");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn absent_globals_fail_the_same_way() {
    let err = construct(rotate().call(call_args! { num: 3 })).unwrap_err();
    assert!(matches!(err, ConstructError::UnresolvableVariable { .. }));
}

#[test]
fn record_typed_parameters_expose_field_references() {
    let sides = param(
        "SIDES",
        ValueType::record("Sides", [("left", ValueType::Int), ("right", ValueType::Int)]),
    );
    let result = sum().call(call_args! {
        left: sides.clone().field("left"),
        right: sides.field("right"),
    });
    let workflow = construct(result).unwrap();

    let step = workflow.steps()[0].step();
    match step.arguments().get("left") {
        Some(Bound::Reference(reference)) => {
            assert_eq!(reference.canonical_repr(), "param:SIDES/left");
            assert_eq!(reference.typ(), &ValueType::Int);
        }
        other => panic!("expected a field reference, got {other:?}"),
    }
    assert_eq!(workflow.parameters().len(), 1);
}

#[test]
fn unknown_record_fields_are_a_static_usage_error() {
    let sides = param("SIDES", ValueType::record("Sides", [("left", ValueType::Int)]));
    let err = construct(sum().call(call_args! {
        left: sides.clone().field("left"),
        right: sides.field("middle"),
    }))
    .unwrap_err();
    assert!(matches!(err, ConstructError::UnknownField { field, .. } if field == "middle"));
}

#[test]
fn plain_dict_fields_are_gated_by_configuration() {
    let make_result = || {
        let bag = param("bag", ValueType::map(ValueType::Int));
        sum().call(call_args! { left: bag.field("x"), right: 1 })
    };

    let err = construct(make_result()).unwrap_err();
    assert!(matches!(err, ConstructError::PlainMapField { field } if field == "x"));

    let engine = ConstructEngine::builder().allow_plain_dict_fields(true).build();
    let workflow = engine.construct(make_result()).unwrap();
    let step = workflow.steps()[0].step();
    assert!(matches!(
        step.arguments().get("left"),
        Some(Bound::Reference(_))
    ));
}

#[test]
fn conflicting_parameter_declarations_clash() {
    let result = sum().call(call_args! {
        left: param("num", ValueType::Int),
        right: param("num", ValueType::Float),
    });
    let err = construct(result).unwrap_err();
    assert!(matches!(err, ConstructError::ParameterClash { name } if name == "num"));
}
