//! Contexto explícito del pase de construcción.
//!
//! Todo el estado que el programa original guardaba en thread-locals vive
//! aquí y se enhebra por la cadena de llamadas: configuración, entorno,
//! sequencer, pila de frames de cuerpos y guardia de recursión. Cada pase
//! posee un contexto aislado.

use std::sync::Arc;

use tracing::trace;

use crate::algebra::expr::Expr;
use crate::errors::ConstructError;
use crate::model::raw::RawValue;
use crate::task::definition::TaskDef;
use crate::task::invocation::CallArgs;

use super::config::ConstructConfig;
use super::environment::Environment;
use super::sequencer::Sequencer;

/// Estado del pase: ocioso, capturando llamadas sobre un workflow, o
/// terminado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Capturing,
    Done,
}

/// Frame del cuerpo actualmente en ejecución, si lo hay.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyFrame {
    /// Cuerpo de un task plano, evaluado ansiosamente por un backend.
    /// Llamar tasks aquí dentro es ilegal durante la construcción.
    Task(String),
    /// Cuerpo de un subworkflow: las llamadas anidadas son legales y se
    /// resuelven inmediatamente.
    Subworkflow(String),
}

pub struct ConstructCtx {
    config: ConstructConfig,
    environment: Environment,
    sequencer: Sequencer,
    phase: Phase,
    frames: Vec<BodyFrame>,
    active_calls: Vec<String>,
}

impl ConstructCtx {
    pub(crate) fn new(config: ConstructConfig, environment: Environment) -> Self {
        Self {
            config,
            environment,
            sequencer: Sequencer::new(),
            phase: Phase::Idle,
            frames: Vec::new(),
            active_calls: Vec::new(),
        }
    }

    pub fn config(&self) -> &ConstructConfig {
        &self.config
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Lectura stringly de la configuración, útil dentro de cuerpos de
    /// subworkflow que deciden según el modo del pase.
    pub fn configuration(&self, key: &str) -> Option<RawValue> {
        match key {
            "flatten_all_nested" => Some(RawValue::Bool(self.config.flatten_all_nested)),
            "allow_positional_args" => Some(RawValue::Bool(self.config.allow_positional_args)),
            "allow_plain_dict_fields" => {
                Some(RawValue::Bool(self.config.allow_plain_dict_fields))
            }
            "simplify_ids" => Some(RawValue::Bool(self.config.simplify_ids)),
            "field_separator" => Some(RawValue::Str(self.config.field_separator.clone())),
            _ => None,
        }
    }

    /// Override con disciplina de stack: aplica `config` durante `f` y
    /// restaura la anterior al salir, también en el camino de error.
    pub fn with_config<R>(
        &mut self,
        config: ConstructConfig,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let previous = std::mem::replace(&mut self.config, config);
        let out = f(self);
        self.config = previous;
        out
    }

    pub(crate) fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn begin_capture(&mut self) {
        self.phase = Phase::Capturing;
    }

    pub(crate) fn finish(&mut self) {
        self.phase = Phase::Done;
    }

    /// Llamada diferida chequeada: el camino que un backend de ejecución
    /// debe usar al evaluar cuerpos. Dentro del cuerpo de un task plano es
    /// ilegal llamar tasks durante la construcción; dentro de un
    /// subworkflow es válido y produce el placeholder de siempre.
    pub fn defer(&self, task: &Arc<TaskDef>, arguments: CallArgs) -> Result<Expr, ConstructError> {
        if let Some(BodyFrame::Task(caller)) = self.frames.last() {
            return Err(ConstructError::TaskCallInsideTask {
                caller: caller.clone(),
                callee: task.name().to_string(),
            });
        }
        Ok(Arc::clone(task).call(arguments))
    }

    /// Entra al frame del cuerpo de un task plano. Parte del contrato con
    /// el backend externo; el engine en sí nunca ejecuta estos cuerpos.
    pub fn enter_task_body(&mut self, name: impl Into<String>) {
        self.frames.push(BodyFrame::Task(name.into()));
    }

    pub(crate) fn enter_subworkflow_body(&mut self, name: impl Into<String>) {
        self.frames.push(BodyFrame::Subworkflow(name.into()));
    }

    /// Sale del frame actual.
    pub fn exit_body(&mut self) {
        self.frames.pop();
    }

    /// Guardia de recursión: una llamada estructuralmente idéntica a una ya
    /// en curso es autorreferencia incondicional.
    pub(crate) fn is_active(&self, key: &str) -> bool {
        self.active_calls.iter().any(|k| k == key)
    }

    pub(crate) fn push_active(&mut self, key: String) {
        trace!(call = %key, "resolviendo llamada");
        self.active_calls.push(key);
    }

    pub(crate) fn pop_active(&mut self) {
        self.active_calls.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::ValueType;

    fn ctx() -> ConstructCtx {
        ConstructCtx::new(ConstructConfig::default(), Environment::new())
    }

    #[test]
    fn defer_inside_plain_task_body_is_rejected() {
        let mut ctx = ctx();
        let callee = TaskDef::builder("inner").arg("num", ValueType::Int).build();
        ctx.enter_task_body("outer");
        let err = ctx.defer(&callee, CallArgs::new()).unwrap_err();
        match err {
            ConstructError::TaskCallInsideTask { caller, callee } => {
                assert_eq!(caller, "outer");
                assert_eq!(callee, "inner");
            }
            other => panic!("unexpected error: {other}"),
        }
        ctx.exit_body();
        assert!(ctx.defer(&callee, CallArgs::new()).is_ok());
    }

    #[test]
    fn defer_inside_subworkflow_body_is_legal() {
        let mut ctx = ctx();
        let callee = TaskDef::builder("inner").build();
        ctx.enter_subworkflow_body("wrapper");
        assert!(ctx.defer(&callee, CallArgs::new()).is_ok());
    }

    #[test]
    fn config_overrides_restore_on_exit() {
        let mut ctx = ctx();
        let mut flattened = ConstructConfig::default();
        flattened.flatten_all_nested = true;
        let seen = ctx.with_config(flattened, |ctx| {
            ctx.configuration("flatten_all_nested")
        });
        assert_eq!(seen, Some(RawValue::Bool(true)));
        assert_eq!(
            ctx.configuration("flatten_all_nested"),
            Some(RawValue::Bool(false))
        );
    }
}
