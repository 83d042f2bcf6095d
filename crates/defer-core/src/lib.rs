//! defer-core: convierte llamadas diferidas a tasks en un grafo de
//! workflow estático y serializable.
//!
//! Invocar un task no ejecuta nada: produce un placeholder simbólico
//! (`Expr`) que registra la llamada y sus argumentos. Un pase de
//! construcción aparte (`construct`) recorre esos placeholders y arma un
//! `Workflow` canónico: steps con identidad derivada del contenido,
//! parámetros capturados del entorno, subworkflows anidados o aplanados
//! según política, y orden de creación determinista vía sequencer.

pub mod algebra;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod hashing;
pub mod model;
pub mod render;
pub mod task;

pub use algebra::{param, param_with_default, BinaryOp, Expr, UnaryOp};
pub use engine::{construct, ConstructConfig, ConstructCtx, ConstructEngine, Environment};
pub use errors::{ConsistencyError, ConstructError, UnevaluatableError};
pub use model::{
    Bound, FieldPath, FieldSegment, NestedStep, Parameter, Raw, RawValue, Reference, Step,
    ValueType, Workflow, WorkflowStep,
};
pub use render::{base_render, RawRenderModule, RenderMethod, RenderModule, StructuredRenderModule};
pub use task::{ArgDecl, BodyArgs, CallArgs, TaskDef, TaskDefBuilder, TaskKind, TaskRegistry};

#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::Lazy;
}
