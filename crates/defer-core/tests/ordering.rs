//! Orden de creación determinista y aislamiento entre pases concurrentes.

use defer_adapters::tasks::increment;
use defer_core::{call_args, construct, Expr};

fn chain_of_three() -> Expr {
    increment().call(call_args! {
        num: increment().call(call_args! {
            num: increment().call(call_args! { num: 1 }),
        }),
    })
}

#[test]
fn sequence_numbers_follow_creation_order() {
    let workflow = construct(chain_of_three()).unwrap();
    assert_eq!(workflow.steps().len(), 3);

    let seqs: Vec<u64> = workflow
        .steps_in_sequence()
        .iter()
        .map(|ws| ws.step().sequence_num())
        .collect();
    assert_eq!(seqs, vec![0, 1, 2]);

    // el más interno se crea primero
    let first = workflow.steps_in_sequence()[0].step();
    assert_eq!(
        first.arguments().get("num"),
        Some(&defer_core::Bound::Raw(defer_core::Raw::new(1i64)))
    );
}

#[test]
fn concurrent_passes_are_isolated() {
    let handles: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(|| {
                let workflow = construct(chain_of_three()).unwrap();
                let seqs: Vec<u64> = workflow
                    .steps_in_sequence()
                    .iter()
                    .map(|ws| ws.step().sequence_num())
                    .collect();
                let ids: Vec<String> = workflow
                    .steps_in_sequence()
                    .iter()
                    .map(|ws| ws.step().id().to_string())
                    .collect();
                (seqs, ids)
            })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.join().expect("construction thread panicked"));
    }

    for (seqs, _) in &results {
        // cada pase observa un sequencer que arranca en 0
        assert_eq!(seqs, &vec![0, 1, 2]);
    }
    // y el direccionamiento por contenido es idéntico entre hilos
    let reference_ids = &results[0].1;
    for (_, ids) in &results {
        assert_eq!(ids, reference_ids);
    }
}
