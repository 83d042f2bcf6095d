//! Registro simbólico de una llamada a task.

use std::sync::Arc;

use crate::algebra::expr::Expr;

use super::definition::TaskDef;

/// Argumentos de una llamada, en el orden en que se escribieron.
///
/// Una entrada sin nombre registra un argumento posicional: la legalidad se
/// decide durante la construcción (rechazado por defecto, ligado por orden
/// de firma con `allow_positional_args`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallArgs {
    entries: Vec<(Option<String>, Expr)>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.entries.push((Some(name.into()), value.into()));
        self
    }

    pub fn positional(mut self, value: impl Into<Expr>) -> Self {
        self.entries.push((None, value.into()));
        self
    }

    pub fn entries(&self) -> &[(Option<String>, Expr)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Una invocación diferida: el task y sus argumentos, nada más.
/// La resolución a un `Step` ocurre en el pase de construcción.
#[derive(Debug, Clone)]
pub struct Invocation {
    task: Arc<TaskDef>,
    arguments: CallArgs,
}

impl Invocation {
    pub(crate) fn new(task: Arc<TaskDef>, arguments: CallArgs) -> Self {
        Self { task, arguments }
    }

    pub fn task(&self) -> &Arc<TaskDef> {
        &self.task
    }

    pub fn arguments(&self) -> &CallArgs {
        &self.arguments
    }

    /// Representación estructural de la llamada, finita aunque el programa
    /// recursee: solo mira el árbol ya construido.
    pub fn structural_repr(&self) -> String {
        let args: Vec<String> = self
            .arguments
            .entries()
            .iter()
            .map(|(name, expr)| match name {
                Some(n) => format!("{}={}", n, expr.structural_repr()),
                None => expr.structural_repr(),
            })
            .collect();
        format!("{}({})", self.task.name(), args.join(","))
    }
}

impl PartialEq for Invocation {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.task, &other.task) && self.arguments == other.arguments
    }
}
