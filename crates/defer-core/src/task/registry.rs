//! Registro de tasks por workflow.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::errors::ConsistencyError;

use super::definition::TaskDef;

/// Mapa nombre→task de un workflow.
///
/// Registrar dos veces el mismo `TaskDef` es idempotente; registrar el
/// mismo nombre apuntando a otra definición es un clash fatal, porque el
/// grafo de salida identifica tasks por nombre.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: IndexMap<String, Arc<TaskDef>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: &Arc<TaskDef>) -> Result<(), ConsistencyError> {
        if let Some(existing) = self.tasks.get(def.name()) {
            if !Arc::ptr_eq(existing, def) {
                return Err(ConsistencyError::NamingClash { name: def.name().to_string() });
            }
            return Ok(());
        }
        self.tasks.insert(def.name().to_string(), Arc::clone(def));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TaskDef>> {
        self.tasks.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<TaskDef>)> {
        self.tasks.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::ValueType;

    #[test]
    fn same_definition_is_idempotent() {
        let def = TaskDef::builder("inc").arg("num", ValueType::Int).build();
        let mut reg = TaskRegistry::new();
        reg.register(&def).unwrap();
        reg.register(&def).unwrap();
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn distinct_definitions_sharing_a_name_clash() {
        let a = TaskDef::builder("inc").arg("num", ValueType::Int).build();
        let b = TaskDef::builder("inc").arg("num", ValueType::Int).build();
        let mut reg = TaskRegistry::new();
        reg.register(&a).unwrap();
        let err = reg.register(&b).unwrap_err();
        assert!(matches!(err, ConsistencyError::NamingClash { .. }));
    }
}
