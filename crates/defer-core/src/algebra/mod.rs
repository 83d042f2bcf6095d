//! Álgebra de referencias: expresiones simbólicas componibles.
//!
//! Las expresiones se construyen con operadores normales del lenguaje
//! (`a + b`, `-x`, `expr.field(..)`) pero nunca se evalúan durante la
//! construcción: producen un árbol etiquetado que el engine resuelve a un
//! grafo. La coerción directa a bool/número no existe en el tipo; solo hay
//! accesores falibles (`try_*`) que fallan con `UnevaluatableError` sobre
//! nodos sin valor.

pub mod expr;
pub mod iterate;
pub mod ops;

pub use expr::{param, param_with_default, Expr};
pub use iterate::ExprIterator;
pub use ops::{BinaryOp, UnaryOp};
