//! Valores crudos serializables y su representación canónica.
//!
//! `RawValue` es el universo cerrado de valores que pueden viajar dentro de
//! un grafo: primitivos, listas y mapas con clave string. `Raw` envuelve uno
//! de forma inmutable; su identidad sale de la codificación textual
//! `tag|valor`, estable entre pases.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Serialize, Serializer};

/// Valor crudo admitido en un workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<RawValue>),
    Map(BTreeMap<String, RawValue>),
}

impl RawValue {
    /// Tag corto del tipo, prefijo de la representación canónica.
    pub fn type_tag(&self) -> &'static str {
        match self {
            RawValue::Null => "none",
            RawValue::Bool(_) => "bool",
            RawValue::Int(_) => "int",
            RawValue::Float(_) => "float",
            RawValue::Str(_) => "str",
            RawValue::Bytes(_) => "bytes",
            RawValue::List(_) => "list",
            RawValue::Map(_) => "map",
        }
    }

    /// Codificación textual estable (estilo JSON, con extensión `b"…"` para
    /// bytes). No es para mostrar al usuario sino para hashear.
    fn encode_into(&self, out: &mut String) {
        match self {
            RawValue::Null => out.push_str("null"),
            RawValue::Bool(b) => {
                let _ = write!(out, "{b}");
            }
            RawValue::Int(i) => {
                let _ = write!(out, "{i}");
            }
            RawValue::Float(f) => {
                let _ = write!(out, "{f:?}");
            }
            RawValue::Str(s) => out.push_str(&serde_json::Value::String(s.clone()).to_string()),
            RawValue::Bytes(bytes) => {
                out.push_str("b\"");
                for b in bytes {
                    let _ = write!(out, "{b:02x}");
                }
                out.push('"');
            }
            RawValue::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.encode_into(out);
                }
                out.push(']');
            }
            RawValue::Map(entries) => {
                out.push('{');
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(&serde_json::Value::String(k.clone()).to_string());
                    out.push(':');
                    v.encode_into(out);
                }
                out.push('}');
            }
        }
    }

    /// Representación canónica `tag|valor`.
    pub fn canonical_repr(&self) -> String {
        let mut encoded = String::new();
        self.encode_into(&mut encoded);
        format!("{}|{}", self.type_tag(), encoded)
    }

    /// Conversión a `serde_json::Value` para el render boundary.
    /// Bytes se emiten como string hexadecimal.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            RawValue::Null => serde_json::Value::Null,
            RawValue::Bool(b) => serde_json::Value::Bool(*b),
            RawValue::Int(i) => serde_json::Value::from(*i),
            RawValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            RawValue::Str(s) => serde_json::Value::String(s.clone()),
            RawValue::Bytes(bytes) => {
                let mut hex = String::with_capacity(bytes.len() * 2);
                for b in bytes {
                    let _ = write!(hex, "{b:02x}");
                }
                serde_json::Value::String(hex)
            }
            RawValue::List(items) => {
                serde_json::Value::Array(items.iter().map(RawValue::to_json).collect())
            }
            RawValue::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<()> for RawValue {
    fn from(_: ()) -> Self {
        RawValue::Null
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Bool(v)
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        RawValue::Int(v as i64)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Int(v)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Str(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Str(v)
    }
}

impl From<Vec<RawValue>> for RawValue {
    fn from(v: Vec<RawValue>) -> Self {
        RawValue::List(v)
    }
}

impl From<BTreeMap<String, RawValue>> for RawValue {
    fn from(v: BTreeMap<String, RawValue>) -> Self {
        RawValue::Map(v)
    }
}

/// Wrapper inmutable de un `RawValue`.
///
/// Valida consistencia de tipos en un único lugar y da una identidad
/// hash-estable al valor envuelto.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Raw {
    value: RawValue,
}

impl Raw {
    pub fn new(value: impl Into<RawValue>) -> Self {
        Self { value: value.into() }
    }

    pub fn value(&self) -> &RawValue {
        &self.value
    }

    pub fn canonical_repr(&self) -> String {
        self.value.canonical_repr()
    }
}

impl From<RawValue> for Raw {
    fn from(value: RawValue) -> Self {
        Raw { value }
    }
}
