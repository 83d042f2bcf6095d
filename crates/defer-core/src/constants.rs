//! Constantes compartidas del core.

/// Campo implícito de salida de un step cuando no se accede a un campo
/// concreto.
pub const RESULT_FIELD: &str = "out";

/// Separador por defecto entre id y campo en los nombres mostrados.
pub const DEFAULT_FIELD_SEPARATOR: &str = "/";

/// Clave del workflow raíz en la salida de un renderer.
pub const ROOT_KEY: &str = "__root__";
