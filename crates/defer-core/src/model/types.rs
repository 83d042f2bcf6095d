//! Tipos declarados de valores del grafo.
//!
//! Un `ValueType` describe lo que una referencia promete producir: permite
//! validar accesos a campos, conocer longitudes fijas de tuplas y tipar los
//! parámetros de entrada. No hay chequeo profundo de compatibilidad: eso
//! queda para el consumidor del grafo.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

use super::raw::RawValue;

/// Tipo record con campos nombrados y ordenados.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordType {
    pub name: Option<String>,
    pub fields: IndexMap<String, ValueType>,
}

/// Universo cerrado de tipos declarables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ValueType {
    Any,
    Null,
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    List(Box<ValueType>),
    Tuple(Vec<ValueType>),
    Map(Box<ValueType>),
    Record(RecordType),
    Union(Vec<ValueType>),
}

impl ValueType {
    pub fn list(element: ValueType) -> Self {
        ValueType::List(Box::new(element))
    }

    pub fn map(value: ValueType) -> Self {
        ValueType::Map(Box::new(value))
    }

    pub fn tuple(elements: impl IntoIterator<Item = ValueType>) -> Self {
        ValueType::Tuple(elements.into_iter().collect())
    }

    pub fn union(alternatives: impl IntoIterator<Item = ValueType>) -> Self {
        ValueType::Union(alternatives.into_iter().collect())
    }

    pub fn record<N, F>(name: N, fields: F) -> Self
    where
        N: Into<Option<&'static str>>,
        F: IntoIterator<Item = (&'static str, ValueType)>,
    {
        ValueType::Record(RecordType {
            name: name.into().map(str::to_string),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        })
    }

    /// Tipo de un campo nombrado, si este tipo los tiene.
    pub fn field(&self, name: &str) -> Option<&ValueType> {
        match self {
            ValueType::Record(rec) => rec.fields.get(name),
            _ => None,
        }
    }

    /// Longitud fija conocida (solo tuplas declaradas).
    pub fn fixed_len(&self) -> Option<usize> {
        match self {
            ValueType::Tuple(elements) => Some(elements.len()),
            _ => None,
        }
    }

    /// Tipo del elemento en la posición `index`.
    pub fn element(&self, index: usize) -> Option<&ValueType> {
        match self {
            ValueType::List(inner) => Some(inner),
            ValueType::Tuple(elements) => elements.get(index),
            _ => None,
        }
    }

    /// Inferencia simple desde un valor crudo (para defaults de parámetros).
    pub fn of_raw(value: &RawValue) -> ValueType {
        match value {
            RawValue::Null => ValueType::Null,
            RawValue::Bool(_) => ValueType::Bool,
            RawValue::Int(_) => ValueType::Int,
            RawValue::Float(_) => ValueType::Float,
            RawValue::Str(_) => ValueType::Str,
            RawValue::Bytes(_) => ValueType::Bytes,
            RawValue::List(items) => {
                let mut types: Vec<ValueType> = items.iter().map(ValueType::of_raw).collect();
                types.dedup();
                match types.len() {
                    0 => ValueType::list(ValueType::Any),
                    1 => ValueType::List(Box::new(types.remove(0))),
                    _ => ValueType::Tuple(items.iter().map(ValueType::of_raw).collect()),
                }
            }
            RawValue::Map(_) => ValueType::map(ValueType::Any),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Any => write!(f, "any"),
            ValueType::Null => write!(f, "none"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Int => write!(f, "int"),
            ValueType::Float => write!(f, "float"),
            ValueType::Str => write!(f, "str"),
            ValueType::Bytes => write!(f, "bytes"),
            ValueType::List(inner) => write!(f, "list[{inner}]"),
            ValueType::Tuple(elements) => {
                write!(f, "tuple[")?;
                for (i, t) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, "]")
            }
            ValueType::Map(inner) => write!(f, "dict[str, {inner}]"),
            ValueType::Record(rec) => match &rec.name {
                Some(name) => write!(f, "{name}"),
                None => {
                    write!(f, "record{{")?;
                    for (i, k) in rec.fields.keys().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{k}")?;
                    }
                    write!(f, "}}")
                }
            },
            ValueType::Union(alternatives) => {
                for (i, t) in alternatives.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{t}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_fields_resolve() {
        let t = ValueType::record("Sides", [("left", ValueType::Int), ("right", ValueType::Int)]);
        assert_eq!(t.field("left"), Some(&ValueType::Int));
        assert!(t.field("middle").is_none());
        assert_eq!(t.to_string(), "Sides");
    }

    #[test]
    fn tuples_have_fixed_len() {
        let t = ValueType::tuple([ValueType::Int, ValueType::Float]);
        assert_eq!(t.fixed_len(), Some(2));
        assert_eq!(t.element(1), Some(&ValueType::Float));
        assert!(ValueType::list(ValueType::Int).fixed_len().is_none());
    }

    #[test]
    fn of_raw_infers_uniform_lists() {
        let uniform = RawValue::List(vec![RawValue::Int(1), RawValue::Int(2)]);
        assert_eq!(ValueType::of_raw(&uniform), ValueType::list(ValueType::Int));
        let mixed = RawValue::List(vec![RawValue::Int(1), RawValue::Float(2.0)]);
        assert_eq!(
            ValueType::of_raw(&mixed),
            ValueType::tuple([ValueType::Int, ValueType::Float])
        );
    }
}
