//! El grafo resultante de un pase de construcción.

use std::collections::HashMap;

use indexmap::IndexMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::{ConsistencyError, ConstructError};
use crate::model::bound::Bound;
use crate::model::parameter::Parameter;
use crate::model::reference::Reference;
use crate::model::step::WorkflowStep;
use crate::model::types::ValueType;
use crate::task::definition::TaskDef;
use crate::task::registry::TaskRegistry;

/// Workflow: steps ordenados por creación, tasks registrados, parámetros
/// descubiertos y resultado elegido.
///
/// Es propiedad exclusiva del pase que lo construye; al terminar queda de
/// solo lectura y puede compartirse libremente entre renderers. El `id` es
/// un handle de instancia para diagnóstico, nunca parte de la identidad de
/// contenido.
#[derive(Debug)]
pub struct Workflow {
    id: Uuid,
    steps: Vec<WorkflowStep>,
    index: HashMap<String, usize>,
    tasks: TaskRegistry,
    parameters: IndexMap<String, Parameter>,
    result: Option<Bound>,
    remapping: HashMap<String, String>,
}

impl Workflow {
    pub(crate) fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            steps: Vec::new(),
            index: HashMap::new(),
            tasks: TaskRegistry::new(),
            parameters: IndexMap::new(),
            result: None,
            remapping: HashMap::new(),
        }
    }

    pub fn instance_id(&self) -> Uuid {
        self.id
    }

    /// Steps en orden de creación.
    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    /// Steps ordenados explícitamente por número de secuencia. El orden
    /// estructural de `steps()` ya coincide, pero los renderers no deben
    /// depender de eso.
    pub fn steps_in_sequence(&self) -> Vec<&WorkflowStep> {
        let mut out: Vec<&WorkflowStep> = self.steps.iter().collect();
        out.sort_by_key(|ws| ws.step().sequence_num());
        out
    }

    pub fn step_by_id(&self, id: &str) -> Option<&WorkflowStep> {
        self.index.get(id).map(|pos| &self.steps[*pos])
    }

    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    /// Parámetros registrados, en orden de descubrimiento.
    pub fn parameters(&self) -> &IndexMap<String, Parameter> {
        &self.parameters
    }

    /// Descubre los parámetros realmente referenciados, recorriendo los
    /// argumentos de cada step y el resultado, en orden de primer uso.
    pub fn find_parameters(&self) -> IndexMap<String, Parameter> {
        let mut out = IndexMap::new();
        let mut visit = |bound: &Bound| {
            for reference in bound.references() {
                if let Some(name) = reference.parameter_name() {
                    if let Some(parameter) = self.parameters.get(name) {
                        out.entry(name.to_string()).or_insert_with(|| parameter.clone());
                    }
                }
            }
        };
        for ws in &self.steps {
            for bound in ws.step().arguments().values() {
                visit(bound);
            }
        }
        if let Some(result) = &self.result {
            visit(result);
        }
        out
    }

    pub fn result(&self) -> Option<&Bound> {
        self.result.as_ref()
    }

    /// Tipo declarado del resultado, si hay resultado.
    pub fn result_type(&self) -> Option<ValueType> {
        self.result.as_ref().map(Bound::value_type)
    }

    /// Id mostrado para un step: el simplificado si se pidió
    /// `simplify_ids`, el de contenido si no.
    pub fn remap<'a>(&'a self, id: &'a str) -> &'a str {
        self.remapping.get(id).map(String::as_str).unwrap_or(id)
    }

    pub(crate) fn register_task(&mut self, def: &Arc<TaskDef>) -> Result<(), ConsistencyError> {
        self.tasks.register(def)
    }

    pub(crate) fn register_parameter(
        &mut self,
        parameter: &Parameter,
    ) -> Result<Reference, ConstructError> {
        if let Some(existing) = self.parameters.get(parameter.name()) {
            if existing != parameter {
                return Err(ConstructError::ParameterClash {
                    name: parameter.name().to_string(),
                });
            }
        } else {
            self.parameters
                .insert(parameter.name().to_string(), parameter.clone());
        }
        Ok(Reference::parameter(parameter))
    }

    pub(crate) fn insert_step(&mut self, id: String, step: WorkflowStep) {
        self.index.insert(id, self.steps.len());
        self.steps.push(step);
    }

    /// Fija el resultado del workflow, validando que todas sus referencias
    /// pertenezcan a este grafo.
    pub(crate) fn set_result(&mut self, result: Bound) -> Result<(), ConstructError> {
        for reference in result.references() {
            match reference {
                Reference::Step { step_id, .. } => {
                    if !self.index.contains_key(step_id) {
                        return Err(ConstructError::ResultOutsideWorkflow {
                            name: step_id.clone(),
                        });
                    }
                }
                Reference::Parameter { name, .. } => {
                    if !self.parameters.contains_key(name) {
                        return Err(ConstructError::ResultOutsideWorkflow { name: name.clone() });
                    }
                }
            }
        }
        self.result = Some(result);
        Ok(())
    }

    /// Renumera los ids a la forma corta `task-n`, por orden de uso del
    /// task; los workflows anidados reciben el ordinal del padre como
    /// infijo (`task-infijo-n`). Los ids de contenido quedan intactos por
    /// debajo del remapeo.
    pub fn simplify_ids(&mut self) {
        self.simplify_with_infix(&[]);
    }

    fn simplify_with_infix(&mut self, infix: &[String]) {
        let mut counters: HashMap<String, usize> = HashMap::new();
        let mut remapping = HashMap::new();
        let mut ordinals: Vec<usize> = Vec::with_capacity(self.steps.len());
        for ws in &self.steps {
            let step = ws.step();
            let counter = counters.entry(step.task_name().to_string()).or_insert(0);
            *counter += 1;
            ordinals.push(*counter);
            let shown = if infix.is_empty() {
                format!("{}-{}", step.task_name(), counter)
            } else {
                format!("{}-{}-{}", step.task_name(), infix.join("-"), counter)
            };
            remapping.insert(step.id().to_string(), shown);
        }
        self.remapping = remapping;

        for (pos, ws) in self.steps.iter_mut().enumerate() {
            if let WorkflowStep::Nested(nested) = ws {
                let mut child_infix = infix.to_vec();
                child_infix.push(ordinals[pos].to_string());
                nested.subworkflow.simplify_with_infix(&child_infix);
            }
        }
    }

    /// Verificación final: todo id congelado debe seguir coincidiendo con
    /// uno recién computado, recursivamente.
    pub(crate) fn check_identities(&self) -> Result<(), ConsistencyError> {
        for ws in &self.steps {
            ws.step().check_identity()?;
            if let WorkflowStep::Nested(nested) = ws {
                nested.subworkflow.check_identities()?;
            }
        }
        Ok(())
    }
}
