//! Construcción básica: direccionamiento por contenido, determinismo y
//! validación de argumentos.

use defer_adapters::tasks::{increment, sum};
use defer_core::{
    call_args, construct, Bound, ConsistencyError, ConstructEngine, ConstructError, Raw, TaskDef,
    ValueType,
};

#[test]
fn single_increment_scenario() {
    // increment(num=3) -> un workflow con un step `increment-<hash>`,
    // argumento num ligado a Raw(3), sequence_num 0.
    let workflow = construct(increment().call(call_args! { num: 3 })).unwrap();

    assert_eq!(workflow.steps().len(), 1);
    let step = workflow.steps()[0].step();
    assert!(step.id().starts_with("increment-"));
    assert_eq!(step.arguments().get("num"), Some(&Bound::Raw(Raw::new(3i64))));
    assert_eq!(step.sequence_num(), 0);
    assert_eq!(workflow.parameters().len(), 0);
}

#[test]
fn identical_calls_collapse_to_one_step() {
    let result = sum().call(call_args! {
        left: increment().call(call_args! { num: 1 }),
        right: increment().call(call_args! { num: 1 }),
    });
    let workflow = construct(result).unwrap();

    // un solo increment, y la deduplicación no consume números de secuencia
    assert_eq!(workflow.steps().len(), 2);
    let seqs: Vec<u64> = workflow
        .steps()
        .iter()
        .map(|ws| ws.step().sequence_num())
        .collect();
    assert_eq!(seqs, vec![0, 1]);
}

#[test]
fn a_single_differing_raw_changes_the_id() {
    let a = construct(increment().call(call_args! { num: 3 })).unwrap();
    let b = construct(increment().call(call_args! { num: 4 })).unwrap();
    assert_ne!(a.steps()[0].step().id(), b.steps()[0].step().id());
}

#[test]
fn construction_is_deterministic_across_passes() {
    let build = || {
        construct(sum().call(call_args! {
            left: increment().call(call_args! { num: 1 }),
            right: increment().call(call_args! { num: 5 }),
        }))
        .unwrap()
    };
    let first = build();
    let second = build();

    let ids = |wf: &defer_core::Workflow| -> Vec<(String, u64)> {
        wf.steps()
            .iter()
            .map(|ws| (ws.step().id().to_string(), ws.step().sequence_num()))
            .collect()
    };
    assert_eq!(ids(&first), ids(&second));
}

#[test]
fn missing_arguments_throw_an_error() {
    let err = construct(sum().call(call_args! { left: 3 })).unwrap_err();
    match err {
        ConstructError::MissingArgument { task, argument } => {
            assert_eq!(task, "sum");
            assert_eq!(argument, "right");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn positional_arguments_throw_an_error() {
    use defer_core::CallArgs;

    let result = sum().call(CallArgs::new().positional(3).named("right", 4));
    let err = construct(result).unwrap_err();
    assert!(err
        .to_string()
        .starts_with("Arguments must _always_ be named"));
}

#[test]
fn positional_arguments_bind_by_signature_order_when_allowed() {
    use defer_core::CallArgs;

    let engine = ConstructEngine::builder().allow_positional_args(true).build();
    let workflow = engine
        .construct(sum().call(CallArgs::new().positional(3).positional(4)))
        .unwrap();
    let step = workflow.steps()[0].step();
    assert_eq!(step.arguments().get("left"), Some(&Bound::Raw(Raw::new(3i64))));
    assert_eq!(step.arguments().get("right"), Some(&Bound::Raw(Raw::new(4i64))));
}

#[test]
fn unknown_arguments_are_rejected() {
    let err = construct(increment().call(call_args! { value: 3 })).unwrap_err();
    assert!(matches!(err, ConstructError::UnknownArgument { .. }));
}

#[test]
fn naming_clash_between_distinct_callables_is_fatal() {
    // misma firma, otro callable: el registro del workflow debe rechazarlo
    let impostor = TaskDef::builder("increment")
        .arg("num", ValueType::Int)
        .returns(ValueType::Int)
        .build();
    let result = sum().call(call_args! {
        left: increment().call(call_args! { num: 1 }),
        right: impostor.call(call_args! { num: 2 }),
    });
    let err = construct(result).unwrap_err();
    assert!(matches!(
        err,
        ConstructError::Fatal(ConsistencyError::NamingClash { .. })
    ));
}

#[test]
fn reregistering_the_same_callable_is_idempotent() {
    let result = sum().call(call_args! {
        left: increment().call(call_args! { num: 1 }),
        right: increment().call(call_args! { num: 2 }),
    });
    let workflow = construct(result).unwrap();
    assert_eq!(workflow.tasks().len(), 2);
}
