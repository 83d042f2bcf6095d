//! Entorno de valores globales contra el que se resuelven las capturas.
//!
//! Reemplaza la inspección de scope del programa original por un objeto
//! explícito: cada task declara su lista de variables libres y el engine
//! las busca aquí. Solo los valores tipados pueden volverse parámetros.

use indexmap::IndexMap;

use crate::model::raw::RawValue;
use crate::model::types::ValueType;

/// Un valor de alcance global declarado en el entorno.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalDecl {
    pub(crate) value: RawValue,
    pub(crate) typ: Option<ValueType>,
    /// Resolvible solo en construcción: se pliega como constante y nunca se
    /// vuelve input del grafo.
    pub(crate) at_construct: bool,
}

impl GlobalDecl {
    pub fn value(&self) -> &RawValue {
        &self.value
    }

    pub fn typ(&self) -> Option<&ValueType> {
        self.typ.as_ref()
    }

    pub fn is_at_construct(&self) -> bool {
        self.at_construct
    }
}

/// Conjunto de globales visible durante un pase de construcción.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    globals: IndexMap<String, GlobalDecl>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Global con anotación de tipo explícita: capturable como parámetro.
    pub fn typed(
        mut self,
        name: impl Into<String>,
        typ: ValueType,
        value: impl Into<RawValue>,
    ) -> Self {
        self.globals.insert(
            name.into(),
            GlobalDecl { value: value.into(), typ: Some(typ), at_construct: false },
        );
        self
    }

    /// Global sin tipo: presente pero no capturable (referenciarlo desde un
    /// task es un error de construcción).
    pub fn untyped(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.globals.insert(
            name.into(),
            GlobalDecl { value: value.into(), typ: None, at_construct: false },
        );
        self
    }

    /// Global marcado "solo en construcción": se pliega a constante.
    pub fn at_construct(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.globals.insert(
            name.into(),
            GlobalDecl { value: value.into(), typ: None, at_construct: true },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&GlobalDecl> {
        self.globals.get(name)
    }

    pub fn len(&self) -> usize {
        self.globals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.globals.is_empty()
    }
}
