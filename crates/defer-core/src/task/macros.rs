//! Macros utilitarias para declarar tasks sin boilerplate.
//!
//! Exportadas en la raíz del crate para poder usarlas como:
//!   use defer_core::{call_args, deferred_task, subflow};
//!
//! Cada macro genera una función que devuelve siempre el mismo
//! `Arc<TaskDef>` (vía static); esa identidad compartida es la que usa la
//! detección de clashes del registro.

/// Declara un task plano (cuerpo opaco, solo lo ejecuta el backend).
///
/// Formas soportadas:
/// - deferred_task!(task nombre { args: { a: $ty_expr, .. }, returns: $ty_expr });
/// - idem con `captures: ["GLOBAL", ..],` antes de `returns`.
#[macro_export]
macro_rules! deferred_task {
    (
        task $fname:ident {
            args: { $($aname:ident : $atyp:expr),* $(,)? },
            returns: $ret:expr $(,)?
        }
    ) => {
        pub fn $fname() -> std::sync::Arc<$crate::task::TaskDef> {
            static DEF: $crate::__private::Lazy<std::sync::Arc<$crate::task::TaskDef>> =
                $crate::__private::Lazy::new(|| {
                    $crate::task::TaskDef::builder(stringify!($fname))
                        $(.arg(stringify!($aname), $atyp))*
                        .returns($ret)
                        .build()
                });
            std::sync::Arc::clone(&DEF)
        }
    };
    (
        task $fname:ident {
            args: { $($aname:ident : $atyp:expr),* $(,)? },
            captures: [ $($cap:expr),* $(,)? ],
            returns: $ret:expr $(,)?
        }
    ) => {
        pub fn $fname() -> std::sync::Arc<$crate::task::TaskDef> {
            static DEF: $crate::__private::Lazy<std::sync::Arc<$crate::task::TaskDef>> =
                $crate::__private::Lazy::new(|| {
                    $crate::task::TaskDef::builder(stringify!($fname))
                        $(.arg(stringify!($aname), $atyp))*
                        $(.capture($cap))*
                        .returns($ret)
                        .build()
                });
            std::sync::Arc::clone(&DEF)
        }
    };
}

/// Declara un subworkflow: su cuerpo corre durante la construcción y debe
/// devolver `Result<Expr, ConstructError>` con al menos una referencia.
#[macro_export]
macro_rules! subflow {
    (
        workflow $fname:ident {
            args: { $($aname:ident : $atyp:expr),* $(,)? },
            $(captures: [ $($cap:expr),* $(,)? ],)?
            returns: $ret:expr,
            body($ctx:ident, $args:ident) $body:block
        }
    ) => {
        pub fn $fname() -> std::sync::Arc<$crate::task::TaskDef> {
            static DEF: $crate::__private::Lazy<std::sync::Arc<$crate::task::TaskDef>> =
                $crate::__private::Lazy::new(|| {
                    $crate::task::TaskDef::builder(stringify!($fname))
                        $(.arg(stringify!($aname), $atyp))*
                        $($(.capture($cap))*)?
                        .returns($ret)
                        .subworkflow(
                            |$ctx: &mut $crate::engine::ConstructCtx,
                             $args: &$crate::task::BodyArgs|
                             -> Result<$crate::algebra::Expr, $crate::errors::ConstructError> {
                                $body
                            },
                        )
                        .build()
                });
            std::sync::Arc::clone(&DEF)
        }
    };
}

/// Construye `CallArgs` nombrados: `call_args! { num: 3, other: expr }`.
#[macro_export]
macro_rules! call_args {
    () => { $crate::task::CallArgs::new() };
    ($($name:ident : $value:expr),+ $(,)?) => {
        $crate::task::CallArgs::new()$(.named(stringify!($name), $value))+
    };
}
