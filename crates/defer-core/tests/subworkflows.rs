//! Comportamiento de subworkflows: anidado por defecto, aplanado bajo
//! política, burbujeo de capturas y guardas de legalidad.

use defer_adapters::tasks::{add_constant, endless, increment};
use defer_core::{
    call_args, construct, param, Bound, ConstructEngine, ConstructError, Environment, Expr,
    Reference, TaskDef, ValueType, WorkflowStep,
};

fn environment() -> Environment {
    Environment::new().typed("CONSTANT", ValueType::Int, 3)
}

fn program() -> Expr {
    // increment(num=add_constant(num=increment(num=<param num>)))
    increment().call(call_args! {
        num: add_constant().call(call_args! {
            num: increment().call(call_args! { num: param("num", ValueType::Int) }),
        }),
    })
}

#[test]
fn subworkflows_stay_nested_by_default() {
    let engine = ConstructEngine::builder().environment(environment()).build();
    let workflow = engine.construct(program()).unwrap();

    // padre: increment interno, NestedStep, increment externo
    assert_eq!(workflow.steps().len(), 3);
    let nested = workflow
        .steps()
        .iter()
        .find_map(|ws| match ws {
            WorkflowStep::Nested(nested) => Some(nested),
            WorkflowStep::Task(_) => None,
        })
        .expect("expected a NestedStep");

    assert_eq!(nested.step().task_name(), "add_constant");
    // el hijo arranca su propio ámbito de secuencia en 0
    let child = nested.subworkflow();
    assert_eq!(child.steps().len(), 2);
    let child_seqs: Vec<u64> = child.steps().iter().map(|ws| ws.step().sequence_num()).collect();
    assert_eq!(child_seqs, vec![0, 1]);
    assert!(child.result().is_some());
}

#[test]
fn subworkflow_captures_bubble_up_to_the_parent() {
    let engine = ConstructEngine::builder().environment(environment()).build();
    let workflow = engine.construct(program()).unwrap();

    // CONSTANT es parámetro del hijo y burbujea al padre
    assert!(workflow.parameters().contains_key("CONSTANT"));
    assert!(workflow.parameters().contains_key("num"));

    let nested = workflow
        .steps()
        .iter()
        .find_map(|ws| match ws {
            WorkflowStep::Nested(nested) => Some(nested),
            WorkflowStep::Task(_) => None,
        })
        .unwrap();
    assert!(nested.subworkflow().parameters().contains_key("CONSTANT"));
    match nested.step().arguments().get("CONSTANT") {
        Some(Bound::Reference(Reference::Parameter { name, .. })) => {
            assert_eq!(name, "CONSTANT");
        }
        other => panic!("expected a parameter reference, got {other:?}"),
    }
}

#[test]
fn flattening_inlines_child_steps_into_the_parent() {
    let engine = ConstructEngine::builder()
        .environment(environment())
        .flatten_all_nested(true)
        .build();
    let workflow = engine.construct(program()).unwrap();

    // padre (2 increments) + hijo (sum, to_int) = 4 steps planos
    assert_eq!(workflow.steps().len(), 4);
    assert!(workflow.steps().iter().all(|ws| !ws.is_nested()));

    // una sola secuencia estrictamente creciente
    let seqs: Vec<u64> = workflow
        .steps_in_sequence()
        .iter()
        .map(|ws| ws.step().sequence_num())
        .collect();
    assert_eq!(seqs, vec![0, 1, 2, 3]);

    // el orden relativo de creación del cuerpo se preserva
    let tasks: Vec<&str> = workflow
        .steps_in_sequence()
        .iter()
        .map(|ws| ws.step().task_name())
        .collect();
    assert_eq!(tasks, vec!["increment", "sum", "to_int", "increment"]);

    assert!(workflow.parameters().contains_key("CONSTANT"));
}

#[test]
fn subworkflow_result_without_references_fails() {
    let constant_only = TaskDef::builder("constant_only")
        .returns(ValueType::Int)
        .subworkflow(|_ctx, _args| Ok(Expr::from(5i64)))
        .build();
    let err = construct(constant_only.call(call_args! {})).unwrap_err();
    match err {
        ConstructError::NoReferencesInResult { task } => assert_eq!(task, "constant_only"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unconditional_recursion_is_rejected() {
    let err = construct(endless().call(call_args! { num: 3 })).unwrap_err();
    assert!(matches!(err, ConstructError::RecursiveCall { task } if task == "endless"));

    let engine = ConstructEngine::builder().flatten_all_nested(true).build();
    let err = engine.construct(endless().call(call_args! { num: 3 })).unwrap_err();
    assert!(matches!(err, ConstructError::RecursiveCall { .. }));
}

#[test]
fn simplified_ids_use_the_parent_ordinal_as_infix() {
    use defer_adapters::tasks::algorithm;

    let engine = ConstructEngine::builder().simplify_ids(true).build();
    let workflow = engine
        .construct(algorithm().call(call_args! { num: param("num", ValueType::Int) }))
        .unwrap();

    assert_eq!(workflow.steps().len(), 1);
    let nested = match &workflow.steps()[0] {
        WorkflowStep::Nested(nested) => nested,
        other => panic!("expected a NestedStep, got {other:?}"),
    };
    assert_eq!(workflow.remap(nested.step().id()), "algorithm-1");

    let child = nested.subworkflow();
    let shown: Vec<&str> = child
        .steps_in_sequence()
        .iter()
        .map(|ws| child.remap(ws.step().id()))
        .collect();
    assert_eq!(
        shown,
        vec!["increment-1-1", "double-1-1", "increment-1-2", "increment-1-3", "sum-1-1"]
    );
}
