//! Referencias simbólicas a valores aún no computados.
//!
//! Una referencia nunca contiene un valor: solo la información mínima para
//! nombrar su fuente futura (un parámetro o la salida de un step), más un
//! camino de campos/índices derivado. La identidad de una referencia
//! derivada delega en la de su raíz.

use std::fmt::Write as _;

use crate::constants::RESULT_FIELD;
use crate::model::parameter::Parameter;
use crate::model::step::Step;
use crate::model::types::ValueType;
use crate::model::workflow::Workflow;

/// Un tramo del camino de acceso sobre la referencia raíz.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSegment {
    /// Acceso a un campo nombrado de un record.
    Field(String),
    /// Acceso directo por índice.
    Index(usize),
    /// Índice producido por iteración perezosa; los renderers pueden
    /// distinguirlo de un acceso directo.
    Iterated(usize),
}

/// Camino de acceso (posiblemente vacío) colgado de una referencia raíz.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldPath(Vec<FieldSegment>);

impl FieldPath {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[FieldSegment] {
        &self.0
    }

    pub(crate) fn child(&self, segment: FieldSegment) -> FieldPath {
        let mut segments = self.0.clone();
        segments.push(segment);
        FieldPath(segments)
    }

    /// True si algún tramo proviene de una iteración.
    pub fn is_iterated(&self) -> bool {
        self.0.iter().any(|s| matches!(s, FieldSegment::Iterated(_)))
    }

    /// Representación con el separador configurado, p. ej. `/left[2]`.
    pub fn display(&self, separator: &str) -> String {
        let mut out = String::new();
        for segment in &self.0 {
            match segment {
                FieldSegment::Field(name) => {
                    out.push_str(separator);
                    out.push_str(name);
                }
                FieldSegment::Index(i) | FieldSegment::Iterated(i) => {
                    let _ = write!(out, "[{i}]");
                }
            }
        }
        out
    }
}

/// Referencia simbólica: nombra la fuente futura de un valor.
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    /// Valor externo capturado como parámetro del workflow.
    Parameter {
        name: String,
        typ: ValueType,
        path: FieldPath,
    },
    /// Salida de un step, identificado por su id de contenido.
    Step {
        step_id: String,
        task: String,
        typ: ValueType,
        path: FieldPath,
    },
}

impl Reference {
    pub fn parameter(parameter: &Parameter) -> Self {
        Reference::Parameter {
            name: parameter.name().to_string(),
            typ: parameter.typ().clone(),
            path: FieldPath::default(),
        }
    }

    /// Referencia a la salida completa de un step. Leer el id lo congela.
    pub fn step(step: &Step) -> Self {
        Reference::Step {
            step_id: step.id().to_string(),
            task: step.task_name().to_string(),
            typ: step.result_type().clone(),
            path: FieldPath::default(),
        }
    }

    /// Tipo del valor al final del camino actual.
    pub fn typ(&self) -> &ValueType {
        match self {
            Reference::Parameter { typ, .. } | Reference::Step { typ, .. } => typ,
        }
    }

    pub fn path(&self) -> &FieldPath {
        match self {
            Reference::Parameter { path, .. } | Reference::Step { path, .. } => path,
        }
    }

    /// Id del step referenciado, si la raíz es un step.
    pub fn step_id(&self) -> Option<&str> {
        match self {
            Reference::Step { step_id, .. } => Some(step_id),
            Reference::Parameter { .. } => None,
        }
    }

    /// Nombre del parámetro referenciado, si la raíz es un parámetro.
    pub fn parameter_name(&self) -> Option<&str> {
        match self {
            Reference::Parameter { name, .. } => Some(name),
            Reference::Step { .. } => None,
        }
    }

    /// Deriva una referencia un nivel más adentro, a un campo nombrado.
    /// El tipo resultante ya debe estar validado por el engine.
    pub(crate) fn with_field(&self, field: &str, typ: ValueType) -> Self {
        self.derive(FieldSegment::Field(field.to_string()), typ)
    }

    /// Deriva una referencia a un elemento por índice.
    pub(crate) fn with_index(&self, index: usize, iterated: bool, typ: ValueType) -> Self {
        let segment = if iterated {
            FieldSegment::Iterated(index)
        } else {
            FieldSegment::Index(index)
        };
        self.derive(segment, typ)
    }

    fn derive(&self, segment: FieldSegment, typ: ValueType) -> Self {
        match self {
            Reference::Parameter { name, path, .. } => Reference::Parameter {
                name: name.clone(),
                typ,
                path: path.child(segment),
            },
            Reference::Step { step_id, task, path, .. } => Reference::Step {
                step_id: step_id.clone(),
                task: task.clone(),
                typ,
                path: path.child(segment),
            },
        }
    }

    /// Representación estable para hashing de identidades.
    pub fn canonical_repr(&self) -> String {
        match self {
            Reference::Parameter { name, path, .. } => {
                format!("param:{}{}", name, path.display(DEFAULT_SEP))
            }
            Reference::Step { step_id, path, .. } => {
                if path.is_empty() {
                    format!("{}{}{}", step_id, DEFAULT_SEP, RESULT_FIELD)
                } else {
                    format!("{}{}", step_id, path.display(DEFAULT_SEP))
                }
            }
        }
    }

    /// Nombre legible dentro de `workflow`, con ids simplificados si los hay.
    pub fn display_name(&self, workflow: &Workflow, separator: &str) -> String {
        match self {
            Reference::Parameter { name, path, .. } => {
                format!("{}{}", name, path.display(separator))
            }
            Reference::Step { step_id, path, .. } => {
                let shown = workflow.remap(step_id);
                if path.is_empty() {
                    format!("{shown}{separator}{RESULT_FIELD}")
                } else {
                    format!("{}{}", shown, path.display(separator))
                }
            }
        }
    }
}

const DEFAULT_SEP: &str = crate::constants::DEFAULT_FIELD_SEPARATOR;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_reference_paths_display() {
        let p = Parameter::new("SIDES", ValueType::record("Sides", [("left", ValueType::Int)]));
        let r = Reference::parameter(&p).with_field("left", ValueType::Int);
        assert_eq!(r.canonical_repr(), "param:SIDES/left");
        assert_eq!(r.typ(), &ValueType::Int);
    }

    #[test]
    fn iterated_segments_are_tagged() {
        let p = Parameter::new("xs", ValueType::list(ValueType::Int));
        let r = Reference::parameter(&p).with_index(2, true, ValueType::Int);
        assert!(r.path().is_iterated());
        assert_eq!(r.canonical_repr(), "param:xs[2]");
    }
}
