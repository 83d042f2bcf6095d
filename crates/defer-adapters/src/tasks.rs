//! Librería de tasks de ejemplo.
//!
//! Cada función devuelve siempre el mismo `Arc<TaskDef>`: esa identidad
//! compartida es la que permite al registro detectar clashes de nombre.
//! Las capturas declaradas (`INPUT_NUM`, `JUMP`, `CONSTANT`) se resuelven
//! contra el `Environment` del pase.

use std::sync::Arc;

use defer_core::errors::ConstructError;
use defer_core::model::RawValue;
use defer_core::task::TaskDef;
use defer_core::{call_args, deferred_task, subflow, ValueType};

deferred_task! {
    task increment {
        args: { num: ValueType::Int },
        returns: ValueType::Int,
    }
}

deferred_task! {
    task double {
        args: { num: ValueType::Int },
        returns: ValueType::Int,
    }
}

deferred_task! {
    task sum {
        args: { left: ValueType::Int, right: ValueType::Int },
        returns: ValueType::Int,
    }
}

deferred_task! {
    task to_int {
        args: { num: ValueType::union([ValueType::Int, ValueType::Float]) },
        returns: ValueType::Int,
    }
}

// `rotate` lee el global INPUT_NUM además de su argumento.
deferred_task! {
    task rotate {
        args: { num: ValueType::Int },
        captures: ["INPUT_NUM"],
        returns: ValueType::Int,
    }
}

deferred_task! {
    task increase {
        args: { num: ValueType::Int },
        captures: ["JUMP"],
        returns: ValueType::Int,
    }
}

deferred_task! {
    task reverse_list {
        args: { to_sort: ValueType::list(ValueType::Float) },
        returns: ValueType::list(ValueType::Float),
    }
}

deferred_task! {
    task max_list {
        args: { lst: ValueType::list(ValueType::Float) },
        returns: ValueType::Float,
    }
}

// Resultado record con dos campos nombrados.
deferred_task! {
    task split {
        args: {},
        returns: ValueType::record(
            "SplitResult",
            [("first", ValueType::Int), ("second", ValueType::Float)],
        ),
    }
}

deferred_task! {
    task combine {
        args: { left: ValueType::Int, right: ValueType::Float },
        returns: ValueType::Float,
    }
}

subflow! {
    workflow add_constant {
        args: { num: ValueType::Int },
        captures: ["CONSTANT"],
        returns: ValueType::Int,
        body(_ctx, args) {
            let num = args.get("num")?;
            let constant = args.get("CONSTANT")?;
            Ok(to_int().call(call_args! {
                num: sum().call(call_args! { left: num, right: constant }),
            }))
        }
    }
}

subflow! {
    workflow algorithm {
        args: { num: ValueType::Int },
        returns: ValueType::Int,
        body(_ctx, args) {
            let num = args.get("num")?;
            let left = double().call(call_args! {
                num: increment().call(call_args! { num: num }),
            });
            let right = increment().call(call_args! {
                num: increment().call(call_args! { num: 17 }),
            });
            Ok(sum().call(call_args! { left: left, right: right }))
        }
    }
}

subflow! {
    workflow split_sum {
        args: {},
        returns: ValueType::Float,
        body(_ctx, _args) {
            let parts = split().call(call_args! {});
            Ok(combine().call(call_args! {
                left: parts.clone().field("first"),
                right: parts.field("second"),
            }))
        }
    }
}

/// Subworkflow que lee la configuración del pase: su argumento `expected`
/// es construct-time-only y nunca entra al grafo.
pub fn floor() -> Arc<TaskDef> {
    static DEF: defer_core::__private::Lazy<Arc<TaskDef>> =
        defer_core::__private::Lazy::new(|| {
            TaskDef::builder("floor")
                .arg("num", ValueType::Int)
                .at_construct_arg("expected", ValueType::Bool)
                .returns(ValueType::Int)
                .subworkflow(|ctx, args| {
                    let expected = args.raw("expected")?;
                    let seen = ctx
                        .configuration("flatten_all_nested")
                        .unwrap_or(RawValue::Bool(false));
                    if seen != expected {
                        return Err(ConstructError::BodyFailure {
                            task: "floor".to_string(),
                            message: format!(
                                "unexpected configuration: {seen:?} != {expected:?}"
                            ),
                        });
                    }
                    Ok(increment().call(call_args! { num: args.get("num")? }))
                })
                .build()
        });
    Arc::clone(&DEF)
}

/// Subworkflow incondicionalmente recursivo; construirlo debe fallar.
pub fn endless() -> Arc<TaskDef> {
    static DEF: defer_core::__private::Lazy<Arc<TaskDef>> =
        defer_core::__private::Lazy::new(|| {
            TaskDef::builder("endless")
                .arg("num", ValueType::Int)
                .returns(ValueType::Int)
                .subworkflow(|_ctx, args| {
                    Ok(endless().call(call_args! { num: args.get("num")? }))
                })
                .build()
        });
    Arc::clone(&DEF)
}
