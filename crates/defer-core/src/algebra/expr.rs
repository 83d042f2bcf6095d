//! Árbol de expresiones diferidas.

use std::sync::Arc;

use indexmap::IndexMap;

use super::iterate::ExprIterator;
use super::ops::{BinaryOp, UnaryOp};
use crate::errors::UnevaluatableError;
use crate::model::parameter::Parameter;
use crate::model::raw::{Raw, RawValue};
use crate::model::types::ValueType;
use crate::task::invocation::Invocation;

/// Valor diferido que el usuario manipula antes de construir el grafo.
///
/// Cada variante es un placeholder: nada se ejecuta al componer. `Call`
/// registra una invocación de task con sus argumentos; `Field`/`Index`
/// derivan accesos; `Binary`/`Unary` retienen la composición algebraica
/// completa para que el grafo de salida pueda representarla inline.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Raw(Raw),
    Param(Arc<Parameter>),
    Call(Arc<Invocation>),
    Field { parent: Box<Expr>, field: String },
    Index { parent: Box<Expr>, index: usize, iterated: bool },
    List(Vec<Expr>),
    Map(IndexMap<String, Expr>),
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
}

/// Placeholder de un valor externo tipado.
pub fn param(name: impl Into<String>, typ: ValueType) -> Expr {
    Expr::Param(Arc::new(Parameter::new(name, typ)))
}

/// Placeholder de un valor externo con default; el tipo se infiere.
pub fn param_with_default(name: impl Into<String>, default: impl Into<RawValue>) -> Expr {
    Expr::Param(Arc::new(Parameter::with_default(name, default)))
}

impl Expr {
    pub(crate) fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
    }

    pub(crate) fn unary(op: UnaryOp, operand: Expr) -> Expr {
        Expr::Unary { op, operand: Box::new(operand) }
    }

    pub fn list(items: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::List(items.into_iter().collect())
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Expr)>) -> Expr {
        Expr::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Acceso diferido a un campo nombrado. La validación contra el tipo
    /// declarado ocurre durante la construcción, no aquí.
    pub fn field(self, field: impl Into<String>) -> Expr {
        Expr::Field { parent: Box::new(self), field: field.into() }
    }

    /// Acceso diferido por índice.
    pub fn index(self, index: usize) -> Expr {
        Expr::Index { parent: Box::new(self), index, iterated: false }
    }

    /// Iteración perezosa: una secuencia sin cota de accesos indexados.
    /// El consumidor decide cuántos extrae (p. ej. con `zip` o `take`); si
    /// el tipo declarado es una tupla, la secuencia termina sola.
    pub fn iterate(&self) -> ExprIterator {
        ExprIterator::new(self.clone(), self.fixed_len())
    }

    /// Longitud fija conocida, si el tipo declarado o el literal la dan.
    pub fn fixed_len(&self) -> Option<usize> {
        match self {
            Expr::Raw(raw) => match raw.value() {
                RawValue::List(items) => Some(items.len()),
                _ => None,
            },
            Expr::List(items) => Some(items.len()),
            other => other.static_type().and_then(|t| t.fixed_len()),
        }
    }

    /// Tipo declarado derivable estáticamente, si lo hay.
    pub fn static_type(&self) -> Option<ValueType> {
        match self {
            Expr::Raw(raw) => Some(ValueType::of_raw(raw.value())),
            Expr::Param(p) => Some(p.typ().clone()),
            Expr::Call(inv) => Some(inv.task().signature().result().clone()),
            Expr::Field { parent, field } => {
                parent.static_type().and_then(|t| t.field(field).cloned())
            }
            Expr::Index { parent, index, .. } => {
                parent.static_type().and_then(|t| t.element(*index).cloned())
            }
            Expr::List(items) => Some(ValueType::Tuple(
                items
                    .iter()
                    .map(|e| e.static_type().unwrap_or(ValueType::Any))
                    .collect(),
            )),
            Expr::Map(_) => Some(ValueType::map(ValueType::Any)),
            Expr::Binary { left, right, .. } => {
                match (left.static_type(), right.static_type()) {
                    (Some(l), Some(r)) if l == r => Some(l),
                    (Some(l), Some(r)) => Some(ValueType::union([l, r])),
                    _ => None,
                }
            }
            Expr::Unary { operand, .. } => operand.static_type(),
        }
    }

    /// True si el árbol contiene al menos un placeholder (parámetro o
    /// invocación): es la condición para poder construir un grafo.
    pub fn has_references(&self) -> bool {
        match self {
            Expr::Raw(_) => false,
            Expr::Param(_) | Expr::Call(_) => true,
            Expr::Field { parent, .. } | Expr::Index { parent, .. } => parent.has_references(),
            Expr::List(items) => items.iter().any(Expr::has_references),
            Expr::Map(entries) => entries.values().any(Expr::has_references),
            Expr::Binary { left, right, .. } => left.has_references() || right.has_references(),
            Expr::Unary { operand, .. } => operand.has_references(),
        }
    }

    /// Concretización a bool. Solo un `Raw` booleano la admite; cualquier
    /// otro nodo no tiene valor durante la construcción.
    pub fn try_bool(&self) -> Result<bool, UnevaluatableError> {
        match self {
            Expr::Raw(raw) => match raw.value() {
                RawValue::Bool(b) => Ok(*b),
                _ => Err(self.unevaluatable()),
            },
            _ => Err(self.unevaluatable()),
        }
    }

    /// Concretización a entero.
    pub fn try_int(&self) -> Result<i64, UnevaluatableError> {
        match self {
            Expr::Raw(raw) => match raw.value() {
                RawValue::Int(i) => Ok(*i),
                _ => Err(self.unevaluatable()),
            },
            _ => Err(self.unevaluatable()),
        }
    }

    /// Concretización a flotante.
    pub fn try_float(&self) -> Result<f64, UnevaluatableError> {
        match self {
            Expr::Raw(raw) => match raw.value() {
                RawValue::Float(f) => Ok(*f),
                RawValue::Int(i) => Ok(*i as f64),
                _ => Err(self.unevaluatable()),
            },
            _ => Err(self.unevaluatable()),
        }
    }

    fn unevaluatable(&self) -> UnevaluatableError {
        UnevaluatableError { name: self.structural_repr() }
    }

    /// Representación estructural estable: nombra la expresión en errores y
    /// sirve de clave para detectar autorreferencia recursiva.
    pub fn structural_repr(&self) -> String {
        match self {
            Expr::Raw(raw) => raw.canonical_repr(),
            Expr::Param(p) => format!("param:{}", p.name()),
            Expr::Call(inv) => inv.structural_repr(),
            Expr::Field { parent, field } => format!("{}.{}", parent.structural_repr(), field),
            Expr::Index { parent, index, .. } => {
                format!("{}[{}]", parent.structural_repr(), index)
            }
            Expr::List(items) => {
                let inner: Vec<String> = items.iter().map(Expr::structural_repr).collect();
                format!("[{}]", inner.join(","))
            }
            Expr::Map(entries) => {
                let inner: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}:{}", k, v.structural_repr()))
                    .collect();
                format!("{{{}}}", inner.join(","))
            }
            Expr::Binary { op, left, right } => format!(
                "({} {} {})",
                left.structural_repr(),
                op.symbol(),
                right.structural_repr()
            ),
            Expr::Unary { op, operand } => {
                format!("({}{})", op.symbol(), operand.structural_repr())
            }
        }
    }
}

impl From<Raw> for Expr {
    fn from(raw: Raw) -> Expr {
        Expr::Raw(raw)
    }
}

impl From<RawValue> for Expr {
    fn from(value: RawValue) -> Expr {
        Expr::Raw(Raw::new(value))
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Expr {
        Expr::Raw(Raw::new(value))
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Expr {
        Expr::Raw(Raw::new(value))
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Expr {
        Expr::Raw(Raw::new(value))
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Expr {
        Expr::Raw(Raw::new(value))
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Expr {
        Expr::Raw(Raw::new(value))
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Expr {
        Expr::Raw(Raw::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_reference_cannot_be_coerced() {
        let p = param("num", ValueType::Int);
        let err = p.try_bool().unwrap_err();
        assert!(err.to_string().contains("param:num"));
        assert!(p.try_int().is_err());
    }

    #[test]
    fn raw_scalars_concretize() {
        assert_eq!(Expr::from(3i64).try_int().unwrap(), 3);
        assert_eq!(Expr::from(true).try_bool().unwrap(), true);
        assert_eq!(Expr::from(3i64).try_float().unwrap(), 3.0);
    }

    #[test]
    fn field_access_is_deferred() {
        let sides = param(
            "SIDES",
            ValueType::record("Sides", [("left", ValueType::Int)]),
        );
        let left = sides.field("left");
        assert_eq!(left.static_type(), Some(ValueType::Int));
        assert!(left.has_references());
    }
}
