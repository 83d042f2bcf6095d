//! Definición de tasks: firma declarada, capturas y cuerpo.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::algebra::expr::Expr;
use crate::errors::ConstructError;
use crate::model::raw::RawValue;
use crate::model::types::ValueType;

use super::invocation::{CallArgs, Invocation};

/// Clase del task: los cuerpos de los tasks planos solo corren en el
/// backend de ejecución; los subworkflows se resuelven completos durante la
/// construcción.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Task,
    Subworkflow,
}

/// Declaración de un argumento de la firma.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgDecl {
    pub name: String,
    pub typ: ValueType,
    pub default: Option<RawValue>,
    /// Marcador de tipo "solo en construcción": el valor se consume al
    /// construir (constant-folded) y nunca entra al grafo.
    pub at_construct: bool,
}

/// Firma declarada: argumentos ordenados + tipo de resultado.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    args: Vec<ArgDecl>,
    result: ValueType,
}

impl Signature {
    pub fn args(&self) -> &[ArgDecl] {
        &self.args
    }

    pub fn result(&self) -> &ValueType {
        &self.result
    }

    pub fn has_arg(&self, name: &str) -> bool {
        self.args.iter().any(|a| a.name == name)
    }
}

/// Argumentos ya ligados que recibe el cuerpo de un subworkflow.
///
/// Los argumentos normales llegan como expresiones (referencias a
/// parámetros del workflow hijo, o los valores del padre si se aplana);
/// los marcados `at_construct` llegan ya plegados a un valor concreto.
pub struct BodyArgs {
    task: String,
    values: IndexMap<String, Expr>,
}

impl BodyArgs {
    pub(crate) fn new(task: impl Into<String>, values: IndexMap<String, Expr>) -> Self {
        Self { task: task.into(), values }
    }

    /// Expresión ligada al argumento o captura `name`.
    pub fn get(&self, name: &str) -> Result<Expr, ConstructError> {
        self.values.get(name).cloned().ok_or_else(|| ConstructError::UnknownArgument {
            task: self.task.clone(),
            argument: name.to_string(),
        })
    }

    /// Valor concreto de un binding `at_construct`.
    pub fn raw(&self, name: &str) -> Result<RawValue, ConstructError> {
        match self.get(name)? {
            Expr::Raw(raw) => Ok(raw.value().clone()),
            other => Err(ConstructError::AtConstructReference {
                task: self.task.clone(),
                argument: format!("{} ({})", name, other.structural_repr()),
            }),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Cuerpo de un subworkflow: corre durante la construcción y debe devolver
/// una expresión con referencias.
pub type SubworkflowBody = Arc<
    dyn Fn(&mut crate::engine::ConstructCtx, &BodyArgs) -> Result<Expr, ConstructError>
        + Send
        + Sync,
>;

/// Cuerpo de un task.
#[derive(Clone)]
pub enum TaskBody {
    /// Opaco: solo lo ejecuta el backend externo, nunca la construcción.
    Opaque,
    /// Resuelto íntegramente durante la construcción.
    Subworkflow(SubworkflowBody),
}

/// Unidad de cómputo diferido con nombre.
///
/// La identidad del callable subyacente es la identidad del `Arc`: dos
/// registros del mismo nombre deben apuntar al mismo `TaskDef`, si no hay
/// clash de nombres.
pub struct TaskDef {
    name: String,
    kind: TaskKind,
    signature: Signature,
    captures: Vec<String>,
    body: TaskBody,
}

impl TaskDef {
    pub fn builder(name: impl Into<String>) -> TaskDefBuilder {
        TaskDefBuilder {
            name: name.into(),
            kind: TaskKind::Task,
            args: Vec::new(),
            captures: Vec::new(),
            result: ValueType::Any,
            body: TaskBody::Opaque,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Lista de capturas declarada: variables libres que el cuerpo lee y
    /// que deben resolverse contra el `Environment` al construir.
    pub fn captures(&self) -> &[String] {
        &self.captures
    }

    /// Cuerpo subyacente, para introspección del backend de ejecución.
    pub fn body(&self) -> &TaskBody {
        &self.body
    }

    /// Invocación diferida: registra la llamada sin ejecutar nada.
    pub fn call(self: Arc<Self>, arguments: CallArgs) -> Expr {
        Expr::Call(Arc::new(Invocation::new(self, arguments)))
    }
}

impl fmt::Debug for TaskDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("args", &self.signature.args.len())
            .field("captures", &self.captures)
            .finish()
    }
}

/// Builder de definiciones de task.
pub struct TaskDefBuilder {
    name: String,
    kind: TaskKind,
    args: Vec<ArgDecl>,
    captures: Vec<String>,
    result: ValueType,
    body: TaskBody,
}

impl TaskDefBuilder {
    pub fn arg(mut self, name: impl Into<String>, typ: ValueType) -> Self {
        self.args.push(ArgDecl { name: name.into(), typ, default: None, at_construct: false });
        self
    }

    pub fn arg_with_default(
        mut self,
        name: impl Into<String>,
        typ: ValueType,
        default: impl Into<RawValue>,
    ) -> Self {
        self.args.push(ArgDecl {
            name: name.into(),
            typ,
            default: Some(default.into()),
            at_construct: false,
        });
        self
    }

    /// Argumento consumible solo durante la construcción.
    pub fn at_construct_arg(mut self, name: impl Into<String>, typ: ValueType) -> Self {
        self.args.push(ArgDecl { name: name.into(), typ, default: None, at_construct: true });
        self
    }

    pub fn capture(mut self, name: impl Into<String>) -> Self {
        self.captures.push(name.into());
        self
    }

    pub fn returns(mut self, typ: ValueType) -> Self {
        self.result = typ;
        self
    }

    /// Convierte la definición en subworkflow con el cuerpo dado.
    pub fn subworkflow<F>(mut self, body: F) -> Self
    where
        F: Fn(&mut crate::engine::ConstructCtx, &BodyArgs) -> Result<Expr, ConstructError>
            + Send
            + Sync
            + 'static,
    {
        self.kind = TaskKind::Subworkflow;
        self.body = TaskBody::Subworkflow(Arc::new(body));
        self
    }

    pub fn build(self) -> Arc<TaskDef> {
        Arc::new(TaskDef {
            name: self.name,
            kind: self.kind,
            signature: Signature { args: self.args, result: self.result },
            captures: self.captures,
            body: self.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calling_a_task_defers() {
        let def = TaskDef::builder("increment")
            .arg("num", ValueType::Int)
            .returns(ValueType::Int)
            .build();
        let expr = def.call(CallArgs::new().named("num", 3i64));
        assert!(expr.has_references());
        assert_eq!(expr.structural_repr(), "increment(num=int|3)");
    }
}
