//! Configuración del pase de construcción.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_FIELD_SEPARATOR;

/// Opciones reconocidas por `construct`. Viven en el contexto explícito del
/// pase: nada de estado global mutable, los overrides anidados se apilan y
/// restauran con disciplina de stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructConfig {
    /// Aplana recursivamente los subworkflows en la lista de steps del
    /// padre, en lugar de dejarlos como `NestedStep` opacos.
    pub flatten_all_nested: bool,
    /// Permite argumentos posicionales, ligados por orden de firma.
    pub allow_positional_args: bool,
    /// Permite acceso a campos sobre tipos dict planos (sin record).
    pub allow_plain_dict_fields: bool,
    /// Renumera los ids a la forma corta secuencial al terminar.
    pub simplify_ids: bool,
    /// Separador entre id y campo en los nombres mostrados.
    pub field_separator: String,
}

impl Default for ConstructConfig {
    fn default() -> Self {
        Self {
            flatten_all_nested: false,
            allow_positional_args: false,
            allow_plain_dict_fields: false,
            simplify_ids: false,
            field_separator: DEFAULT_FIELD_SEPARATOR.to_string(),
        }
    }
}
