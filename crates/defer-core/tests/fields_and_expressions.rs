//! Referencias derivadas (campos, iteración) y argumentos con expresiones
//! compuestas.

use defer_adapters::tasks::{combine, increment, max_list, reverse_list, split, sum};
use defer_core::{
    call_args, construct, param, param_with_default, Bound, Expr, FieldSegment, Reference,
    ValueType,
};

#[test]
fn record_step_results_expose_typed_fields() {
    let parts = split().call(call_args! {});
    let result = combine().call(call_args! {
        left: parts.clone().field("first"),
        right: parts.field("second"),
    });
    let workflow = construct(result).unwrap();

    assert_eq!(workflow.steps().len(), 2);
    let combine_step = workflow
        .steps()
        .iter()
        .map(|ws| ws.step())
        .find(|s| s.task_name() == "combine")
        .unwrap();

    match combine_step.arguments().get("left") {
        Some(Bound::Reference(reference)) => {
            assert!(reference.canonical_repr().ends_with("/first"));
            assert_eq!(reference.typ(), &ValueType::Int);
            assert!(reference.step_id().unwrap().starts_with("split-"));
        }
        other => panic!("expected a field reference, got {other:?}"),
    }
}

#[test]
fn field_access_on_a_fieldless_type_fails() {
    let result = increment()
        .call(call_args! { num: 3 })
        .field("first");
    let err = construct(sum().call(call_args! { left: result, right: 1 })).unwrap_err();
    assert!(matches!(
        err,
        defer_core::ConstructError::FieldOnUnfieldable { .. }
    ));
}

#[test]
fn iteration_produces_tagged_indexed_references() {
    let pair = param("pair", ValueType::tuple([ValueType::Int, ValueType::Int]));
    let drawn: Vec<Expr> = pair.iterate().collect();
    assert_eq!(drawn.len(), 2);

    let result = sum().call(call_args! {
        left: increment().call(call_args! { num: drawn[0].clone() }),
        right: increment().call(call_args! { num: drawn[1].clone() }),
    });
    let workflow = construct(result).unwrap();

    let first_increment = workflow.steps_in_sequence()[0].step();
    match first_increment.arguments().get("num") {
        Some(Bound::Reference(reference)) => {
            assert_eq!(reference.canonical_repr(), "param:pair[0]");
            assert!(matches!(
                reference.path().segments(),
                [FieldSegment::Iterated(0)]
            ));
        }
        other => panic!("expected an iterated reference, got {other:?}"),
    }
}

#[test]
fn expression_arguments_retain_their_references() {
    // max_list(lst=reversed + reversed): la expresión retiene sus fuentes
    let pi = param_with_default("pi", 3.141592653589793);
    let reversed = reverse_list().call(call_args! {
        to_sort: Expr::list([Expr::from(1.0f64), Expr::from(3.0f64), pi]),
    });
    let result = max_list().call(call_args! { lst: reversed.clone() + reversed });
    let workflow = construct(result).unwrap();

    // reverse_list se deduplica: sus dos menciones son la misma llamada
    assert_eq!(workflow.steps().len(), 2);
    let max_step = workflow
        .steps()
        .iter()
        .map(|ws| ws.step())
        .find(|s| s.task_name() == "max_list")
        .unwrap();

    match max_step.arguments().get("lst") {
        Some(bound @ Bound::Binary { .. }) => {
            let references = bound.references();
            assert_eq!(references.len(), 2);
            assert!(references
                .iter()
                .all(|r| r.step_id().unwrap().starts_with("reverse_list-")));
        }
        other => panic!("expected an inline expression, got {other:?}"),
    }

    // el parámetro del literal de lista llega al workflow
    assert!(workflow.parameters().contains_key("pi"));
    let reverse_step = workflow
        .steps()
        .iter()
        .map(|ws| ws.step())
        .find(|s| s.task_name() == "reverse_list")
        .unwrap();
    match reverse_step.arguments().get("to_sort") {
        Some(Bound::List(items)) => {
            assert_eq!(items.len(), 3);
            assert!(matches!(items[2], Bound::Reference(Reference::Parameter { .. })));
        }
        other => panic!("expected a list with a reference, got {other:?}"),
    }
}
