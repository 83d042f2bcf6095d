//! Definición y registro de tasks.
//!
//! Un task es una unidad de cómputo diferido con nombre: declararlo no
//! ejecuta nada; invocarlo produce un placeholder (`Expr::Call`). Este
//! módulo define:
//! - `TaskDef`: firma, capturas declaradas y cuerpo (opaco o subworkflow).
//! - `CallArgs`/`Invocation`: registro de una llamada con sus argumentos.
//! - `TaskRegistry`: mapa nombre→task por workflow, con detección de clash.
//! - Macros `deferred_task!`/`subflow!`/`call_args!` para declarar sin
//!   boilerplate.

pub mod definition;
pub mod invocation;
pub mod macros;
pub mod registry;

pub use definition::{ArgDecl, BodyArgs, Signature, TaskBody, TaskDef, TaskDefBuilder, TaskKind};
pub use invocation::{CallArgs, Invocation};
pub use registry::TaskRegistry;
