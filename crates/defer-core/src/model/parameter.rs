//! Parámetros: valores externos tipados que entran al grafo como inputs.

use serde::Serialize;

use super::raw::RawValue;
use super::types::ValueType;

/// Valor externo nombrado y tipado, descubierto durante la construcción.
/// Su vida útil es la del `Workflow` que lo registra.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    name: String,
    typ: ValueType,
    default: Option<RawValue>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, typ: ValueType) -> Self {
        Self { name: name.into(), typ, default: None }
    }

    /// Parámetro con default; el tipo se infiere del valor.
    pub fn with_default(name: impl Into<String>, default: impl Into<RawValue>) -> Self {
        let default = default.into();
        Self {
            name: name.into(),
            typ: ValueType::of_raw(&default),
            default: Some(default),
        }
    }

    /// Fija un default explícito conservando el tipo declarado.
    pub fn default_value(mut self, default: impl Into<RawValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn typ(&self) -> &ValueType {
        &self.typ
    }

    pub fn default(&self) -> Option<&RawValue> {
        self.default.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_infers_type() {
        let p = Parameter::with_default("pi", 3.14);
        assert_eq!(p.typ(), &ValueType::Float);
        assert_eq!(p.default(), Some(&RawValue::Float(3.14)));
    }
}
