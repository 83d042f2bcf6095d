//! Errores del core de construcción.
//!
//! Una sola familia de errores de cara al usuario (`ConstructError`), con
//! contexto suficiente (task, variable, argumento) para diagnosticar.
//! Las violaciones de consistencia interna (`ConsistencyError`) son una
//! clase aparte: fatales, no recuperables, indican un bug o un mal uso del
//! registro, no un programa de usuario inválido.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Intento de tratar una referencia como su valor en tiempo de ejecución
/// (comparación concreta, coerción numérica o booleana).
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("this reference, {name}, cannot be evaluated during construction")]
pub struct UnevaluatableError {
    pub name: String,
}

/// Violación de consistencia: fatal y no recuperable.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsistencyError {
    #[error("naming clash for tasks: '{name}' is already registered with a different target")]
    NamingClash { name: String },
    #[error("cannot change a step after requesting its id: {step}")]
    FrozenIdentity { step: String },
    #[error("internal: {0}")]
    Internal(String),
}

/// Error de construcción de cara al usuario. Aborta el pase actual; nunca
/// se devuelve un grafo parcial.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstructError {
    #[error("calling {task}: missing a required argument: '{argument}'")]
    MissingArgument { task: String, argument: String },
    #[error("Arguments must _always_ be named: {task} received {count} positional argument(s)")]
    PositionalArgument { task: String, count: usize },
    #[error("calling {task}: unexpected argument '{argument}'")]
    UnknownArgument { task: String, argument: String },
    #[error("calling {task}: argument '{argument}' given more than once")]
    DuplicateArgument { task: String, argument: String },
    #[error("attempted to call task '{callee}' inside the body of task '{caller}'; task bodies only run on the execution backend")]
    TaskCallInsideTask { caller: String, callee: String },
    #[error("subworkflow '{task}' returned a result with no references")]
    NoReferencesInResult { task: String },
    #[error("error inside the body of '{task}': {message}")]
    BodyFailure { task: String, message: String },
    #[error("construction result contains no references; nothing to build a workflow from")]
    NoReferences,
    #[error("task '{task}' refers to free variable '{variable}', which is not a typed module-scope value in the environment")]
    UnresolvableVariable { task: String, variable: String },
    #[error("calling {task}: argument '{argument}' is construct-time-only and cannot be given a reference")]
    AtConstructReference { task: String, argument: String },
    #[error("task '{task}': construct-time-only binding '{binding}' cannot be used by a plain task")]
    AtConstructMisuse { task: String, binding: String },
    #[error("type {typ} has no field '{field}'")]
    UnknownField { field: String, typ: String },
    #[error("field '{field}' on a plain dict type; enable allow_plain_dict_fields to permit this")]
    PlainMapField { field: String },
    #[error("field access '{field}' on non-record type {typ}")]
    FieldOnUnfieldable { field: String, typ: String },
    #[error("index {index} out of range for type {typ}")]
    IndexOutOfRange { index: usize, typ: String },
    #[error("type {typ} is not indexable")]
    NotIndexable { typ: String },
    #[error("unconditional recursive self-reference while constructing '{task}'")]
    RecursiveCall { task: String },
    #[error("parameter '{name}' already registered with a different type or default")]
    ParameterClash { name: String },
    #[error("workflow result refers to '{name}', which does not belong to this workflow")]
    ResultOutsideWorkflow { name: String },
    #[error(transparent)]
    Unevaluatable(#[from] UnevaluatableError),
    #[error(transparent)]
    Fatal(#[from] ConsistencyError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_message_has_stable_prefix() {
        let err = ConstructError::PositionalArgument { task: "add_task".into(), count: 1 };
        assert!(err.to_string().starts_with("Arguments must _always_ be named"));
    }

    #[test]
    fn fatal_errors_keep_their_class() {
        let err: ConstructError =
            ConsistencyError::NamingClash { name: "increment".into() }.into();
        assert!(matches!(
            err,
            ConstructError::Fatal(ConsistencyError::NamingClash { .. })
        ));
    }
}
