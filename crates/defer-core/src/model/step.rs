//! Steps: invocaciones concretas de un task dentro de un workflow.

use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::errors::ConsistencyError;
use crate::hashing::hash_value;
use crate::model::bound::Bound;
use crate::model::types::ValueType;
use crate::model::workflow::Workflow;
use crate::task::definition::TaskDef;

/// Una invocación de task ligada a argumentos resueltos.
///
/// La identidad es derivada del contenido: `"{task}-{hash(task, args)}"`.
/// Se computa perezosamente y queda congelada en la primera lectura;
/// cualquier divergencia posterior es un error fatal de consistencia.
#[derive(Debug)]
pub struct Step {
    task: Arc<TaskDef>,
    arguments: IndexMap<String, Bound>,
    sequence_num: u64,
    result_type: ValueType,
    id: OnceCell<String>,
}

impl Step {
    pub(crate) fn new(
        task: Arc<TaskDef>,
        arguments: IndexMap<String, Bound>,
        sequence_num: u64,
    ) -> Self {
        let result_type = task.signature().result().clone();
        Self { task, arguments, sequence_num, result_type, id: OnceCell::new() }
    }

    /// Identidad derivable de `(task, argumentos ordenados)`, sin construir
    /// un `Step`: la deduplicación la necesita antes de insertar.
    pub fn compute_id(task: &TaskDef, arguments: &IndexMap<String, Bound>) -> String {
        let args: Vec<serde_json::Value> = arguments
            .iter()
            .map(|(name, value)| serde_json::json!([name, value.canonical_repr()]))
            .collect();
        let fp = serde_json::json!({
            "task": task.name(),
            "arguments": args,
        });
        format!("{}-{}", task.name(), hash_value(&fp))
    }

    /// Id de contenido, congelado en la primera lectura.
    pub fn id(&self) -> &str {
        self.id
            .get_or_init(|| Self::compute_id(&self.task, &self.arguments))
    }

    /// Verifica que el id congelado siga coincidiendo con uno recién
    /// computado. Una divergencia indica mutación tras la congelación.
    pub fn check_identity(&self) -> Result<(), ConsistencyError> {
        if let Some(frozen) = self.id.get() {
            let fresh = Self::compute_id(&self.task, &self.arguments);
            if *frozen != fresh {
                return Err(ConsistencyError::FrozenIdentity {
                    step: self.task.name().to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn task(&self) -> &Arc<TaskDef> {
        &self.task
    }

    pub fn task_name(&self) -> &str {
        self.task.name()
    }

    pub fn arguments(&self) -> &IndexMap<String, Bound> {
        &self.arguments
    }

    pub fn sequence_num(&self) -> u64 {
        self.sequence_num
    }

    pub fn result_type(&self) -> &ValueType {
        &self.result_type
    }
}

/// Step que envuelve un workflow hijo completo.
#[derive(Debug)]
pub struct NestedStep {
    pub(crate) step: Step,
    pub(crate) subworkflow: Workflow,
}

impl NestedStep {
    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn subworkflow(&self) -> &Workflow {
        &self.subworkflow
    }
}

/// Unión cerrada sobre la que el render boundary puede hacer match
/// exhaustivo: o un step plano o un subworkflow anidado.
#[derive(Debug)]
pub enum WorkflowStep {
    Task(Step),
    Nested(NestedStep),
}

impl WorkflowStep {
    /// Núcleo común (task, argumentos, identidad, número de secuencia).
    pub fn step(&self) -> &Step {
        match self {
            WorkflowStep::Task(step) => step,
            WorkflowStep::Nested(nested) => &nested.step,
        }
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, WorkflowStep::Nested(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::raw::Raw;
    use crate::model::types::ValueType;

    fn increment() -> Arc<TaskDef> {
        TaskDef::builder("increment")
            .arg("num", ValueType::Int)
            .returns(ValueType::Int)
            .build()
    }

    #[test]
    fn identity_is_content_derived() {
        let task = increment();
        let mut args = IndexMap::new();
        args.insert("num".to_string(), Bound::Raw(Raw::new(3i64)));
        let a = Step::compute_id(&task, &args);
        let b = Step::compute_id(&task, &args);
        assert_eq!(a, b);
        assert!(a.starts_with("increment-"));

        let mut other = IndexMap::new();
        other.insert("num".to_string(), Bound::Raw(Raw::new(4i64)));
        assert_ne!(a, Step::compute_id(&task, &other));
    }

    #[test]
    fn frozen_identity_is_stable() {
        let task = increment();
        let mut args = IndexMap::new();
        args.insert("num".to_string(), Bound::Raw(Raw::new(3i64)));
        let step = Step::new(task, args, 0);
        let first = step.id().to_string();
        assert_eq!(step.id(), first);
        step.check_identity().unwrap();
    }
}
