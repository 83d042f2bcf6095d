//! Engine de construcción: traza de llamadas diferidas → grafo estático.
//!
//! Responsable de recorrer el árbol de expresiones del resultado, crear
//! steps con identidad de contenido (colapsando llamadas idénticas),
//! capturar globales como parámetros, validar la legalidad de cada llamada
//! y plegar o anidar subworkflows según la política configurada.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::algebra::expr::Expr;
use crate::errors::{ConsistencyError, ConstructError};
use crate::model::bound::Bound;
use crate::model::parameter::Parameter;
use crate::model::raw::{Raw, RawValue};
use crate::model::reference::Reference;
use crate::model::step::{NestedStep, Step, WorkflowStep};
use crate::model::types::ValueType;
use crate::model::workflow::Workflow;
use crate::task::definition::{BodyArgs, SubworkflowBody, TaskBody, TaskDef, TaskKind};
use crate::task::invocation::{CallArgs, Invocation};

use super::builder::EngineBuilderInit;
use super::config::ConstructConfig;
use super::context::ConstructCtx;
use super::environment::Environment;

/// Motor de construcción de workflows.
///
/// Inmutable y reutilizable: cada `construct` abre un pase aislado con su
/// propio contexto, workflow y sequencer, por lo que pases independientes
/// pueden correr en paralelo sin estado compartido.
#[derive(Debug, Default)]
pub struct ConstructEngine {
    config: ConstructConfig,
    environment: Environment,
}

impl ConstructEngine {
    /// Crea un builder para configurar el engine.
    #[inline]
    pub fn builder() -> EngineBuilderInit {
        EngineBuilderInit::default()
    }

    /// Engine con configuración y entorno por defecto.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_parts(config: ConstructConfig, environment: Environment) -> Self {
        Self { config, environment }
    }

    pub fn config(&self) -> &ConstructConfig {
        &self.config
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Punto de entrada: convierte el resultado de una llamada top-level en
    /// un `Workflow`. Falla si la expresión no contiene referencias; ante
    /// cualquier error el pase se aborta sin devolver grafo parcial.
    pub fn construct(&self, result: impl Into<Expr>) -> Result<Workflow, ConstructError> {
        let expr = result.into();
        if !expr.has_references() {
            return Err(ConstructError::NoReferences);
        }
        let mut ctx = ConstructCtx::new(self.config.clone(), self.environment.clone());
        let mut workflow = Workflow::new();
        debug!(workflow = %workflow.instance_id(), "iniciando pase de construcción");
        ctx.begin_capture();
        let scope = ctx.sequencer().scope();
        let result = resolve_expr(&mut ctx, &mut workflow, &expr);
        drop(scope);
        let bound = result?;
        workflow.set_result(bound)?;
        workflow.check_identities()?;
        ctx.finish();
        if self.config.simplify_ids {
            workflow.simplify_ids();
        }
        debug!(
            workflow = %workflow.instance_id(),
            steps = workflow.steps().len(),
            parameters = workflow.parameters().len(),
            "pase de construcción completado"
        );
        Ok(workflow)
    }
}

/// Conveniencia: construye con configuración y entorno por defecto.
pub fn construct(result: impl Into<Expr>) -> Result<Workflow, ConstructError> {
    ConstructEngine::new().construct(result)
}

// -------------------------------------------------------------
// Recorrido de resolución: Expr (placeholders) → Bound (grafo).
// -------------------------------------------------------------

fn resolve_expr(
    ctx: &mut ConstructCtx,
    workflow: &mut Workflow,
    expr: &Expr,
) -> Result<Bound, ConstructError> {
    match expr {
        Expr::Raw(raw) => Ok(Bound::Raw(raw.clone())),
        Expr::Param(parameter) => {
            Ok(Bound::Reference(workflow.register_parameter(parameter)?))
        }
        Expr::Call(invocation) => resolve_call(ctx, workflow, invocation),
        Expr::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(resolve_expr(ctx, workflow, item)?);
            }
            Ok(Bound::List(out).normalized())
        }
        Expr::Map(entries) => {
            let mut out = IndexMap::new();
            for (key, value) in entries {
                out.insert(key.clone(), resolve_expr(ctx, workflow, value)?);
            }
            Ok(Bound::Map(out).normalized())
        }
        Expr::Binary { op, left, right } => {
            let left = resolve_expr(ctx, workflow, left)?;
            let right = resolve_expr(ctx, workflow, right)?;
            Ok(Bound::Binary { op: *op, left: Box::new(left), right: Box::new(right) }
                .normalized())
        }
        Expr::Unary { op, operand } => {
            let operand = resolve_expr(ctx, workflow, operand)?;
            Ok(Bound::Unary { op: *op, operand: Box::new(operand) }.normalized())
        }
        Expr::Field { parent, field } => {
            let parent = resolve_expr(ctx, workflow, parent)?;
            access_field(ctx, parent, field)
        }
        Expr::Index { parent, index, iterated } => {
            let parent = resolve_expr(ctx, workflow, parent)?;
            access_index(parent, *index, *iterated)
        }
    }
}

/// Acceso a campo sobre un valor resuelto. Sobre referencias valida contra
/// el tipo declarado; sobre crudos extrae el valor directamente.
fn access_field(
    ctx: &ConstructCtx,
    parent: Bound,
    field: &str,
) -> Result<Bound, ConstructError> {
    match parent {
        Bound::Reference(reference) => {
            let typ = reference.typ().clone();
            match &typ {
                ValueType::Record(record) => match record.fields.get(field) {
                    Some(field_typ) => Ok(Bound::Reference(
                        reference.with_field(field, field_typ.clone()),
                    )),
                    None => Err(ConstructError::UnknownField {
                        field: field.to_string(),
                        typ: typ.to_string(),
                    }),
                },
                ValueType::Map(inner) => {
                    if ctx.config().allow_plain_dict_fields {
                        Ok(Bound::Reference(reference.with_field(field, (**inner).clone())))
                    } else {
                        Err(ConstructError::PlainMapField { field: field.to_string() })
                    }
                }
                ValueType::Any => {
                    Ok(Bound::Reference(reference.with_field(field, ValueType::Any)))
                }
                other => Err(ConstructError::FieldOnUnfieldable {
                    field: field.to_string(),
                    typ: other.to_string(),
                }),
            }
        }
        Bound::Raw(raw) => match raw.value() {
            RawValue::Map(entries) => match entries.get(field) {
                Some(value) => Ok(Bound::Raw(Raw::new(value.clone()))),
                None => Err(ConstructError::UnknownField {
                    field: field.to_string(),
                    typ: "map".to_string(),
                }),
            },
            other => Err(ConstructError::FieldOnUnfieldable {
                field: field.to_string(),
                typ: other.type_tag().to_string(),
            }),
        },
        Bound::Map(mut entries) => {
            entries
                .shift_remove(field)
                .ok_or_else(|| ConstructError::UnknownField {
                    field: field.to_string(),
                    typ: "map".to_string(),
                })
        }
        other => Err(ConstructError::FieldOnUnfieldable {
            field: field.to_string(),
            typ: other.value_type().to_string(),
        }),
    }
}

/// Acceso indexado sobre un valor resuelto.
fn access_index(parent: Bound, index: usize, iterated: bool) -> Result<Bound, ConstructError> {
    match parent {
        Bound::Reference(reference) => {
            let typ = reference.typ().clone();
            match &typ {
                ValueType::List(inner) => Ok(Bound::Reference(
                    reference.with_index(index, iterated, (**inner).clone()),
                )),
                ValueType::Tuple(elements) => match elements.get(index) {
                    Some(element) => Ok(Bound::Reference(
                        reference.with_index(index, iterated, element.clone()),
                    )),
                    None => Err(ConstructError::IndexOutOfRange {
                        index,
                        typ: typ.to_string(),
                    }),
                },
                ValueType::Any => Ok(Bound::Reference(
                    reference.with_index(index, iterated, ValueType::Any),
                )),
                other => Err(ConstructError::NotIndexable { typ: other.to_string() }),
            }
        }
        Bound::Raw(raw) => match raw.value() {
            RawValue::List(items) => match items.get(index) {
                Some(value) => Ok(Bound::Raw(Raw::new(value.clone()))),
                None => Err(ConstructError::IndexOutOfRange {
                    index,
                    typ: "list".to_string(),
                }),
            },
            other => Err(ConstructError::NotIndexable { typ: other.type_tag().to_string() }),
        },
        Bound::List(mut items) => {
            if index < items.len() {
                Ok(items.swap_remove(index))
            } else {
                Err(ConstructError::IndexOutOfRange { index, typ: "list".to_string() })
            }
        }
        other => Err(ConstructError::NotIndexable { typ: other.value_type().to_string() }),
    }
}

// -------------------------------------------------------------
// Resolución de llamadas.
// -------------------------------------------------------------

/// Argumentos ya ligados contra la firma, separados en los que entran al
/// grafo y los consumibles solo en construcción.
#[derive(Default)]
struct Bindings {
    graph: Vec<(String, Expr)>,
    at_construct: Vec<(String, Expr)>,
}

fn resolve_call(
    ctx: &mut ConstructCtx,
    workflow: &mut Workflow,
    invocation: &Invocation,
) -> Result<Bound, ConstructError> {
    let task = invocation.task();
    let bindings = bind_arguments(ctx, task, invocation.arguments())?;
    match task.kind() {
        TaskKind::Task => resolve_plain_task(ctx, workflow, task, bindings),
        TaskKind::Subworkflow => {
            let key = invocation.structural_repr();
            if ctx.is_active(&key) {
                return Err(ConstructError::RecursiveCall { task: task.name().to_string() });
            }
            ctx.push_active(key);
            let out = resolve_subworkflow(ctx, workflow, task, bindings);
            ctx.pop_active();
            out
        }
    }
}

/// Liga los argumentos de la llamada contra la firma declarada: nombres
/// desconocidos y duplicados se rechazan, los posicionales solo se aceptan
/// bajo `allow_positional_args` (ligados por orden de firma), los que
/// faltan toman su default o fallan.
fn bind_arguments(
    ctx: &ConstructCtx,
    task: &Arc<TaskDef>,
    arguments: &CallArgs,
) -> Result<Bindings, ConstructError> {
    let signature = task.signature();
    let mut named: IndexMap<String, Expr> = IndexMap::new();
    let mut positional: VecDeque<Expr> = VecDeque::new();

    for (name, expr) in arguments.entries() {
        match name {
            Some(name) => {
                if !signature.has_arg(name) {
                    return Err(ConstructError::UnknownArgument {
                        task: task.name().to_string(),
                        argument: name.clone(),
                    });
                }
                if named.insert(name.clone(), expr.clone()).is_some() {
                    return Err(ConstructError::DuplicateArgument {
                        task: task.name().to_string(),
                        argument: name.clone(),
                    });
                }
            }
            None => positional.push_back(expr.clone()),
        }
    }

    if !positional.is_empty() {
        if !ctx.config().allow_positional_args {
            return Err(ConstructError::PositionalArgument {
                task: task.name().to_string(),
                count: positional.len(),
            });
        }
        for decl in signature.args() {
            if named.contains_key(&decl.name) {
                continue;
            }
            match positional.pop_front() {
                Some(expr) => {
                    named.insert(decl.name.clone(), expr);
                }
                None => break,
            }
        }
        if !positional.is_empty() {
            return Err(ConstructError::PositionalArgument {
                task: task.name().to_string(),
                count: positional.len(),
            });
        }
    }

    let mut bindings = Bindings::default();
    for decl in signature.args() {
        let expr = match named.shift_remove(&decl.name) {
            Some(expr) => expr,
            None => match &decl.default {
                Some(default) => Expr::from(Raw::new(default.clone())),
                None => {
                    return Err(ConstructError::MissingArgument {
                        task: task.name().to_string(),
                        argument: decl.name.clone(),
                    })
                }
            },
        };
        if decl.at_construct {
            if task.kind() == TaskKind::Task {
                return Err(ConstructError::AtConstructMisuse {
                    task: task.name().to_string(),
                    binding: decl.name.clone(),
                });
            }
            if expr.has_references() {
                return Err(ConstructError::AtConstructReference {
                    task: task.name().to_string(),
                    argument: decl.name.clone(),
                });
            }
            bindings.at_construct.push((decl.name.clone(), expr));
        } else {
            bindings.graph.push((decl.name.clone(), expr));
        }
    }
    Ok(bindings)
}

fn resolve_plain_task(
    ctx: &mut ConstructCtx,
    workflow: &mut Workflow,
    task: &Arc<TaskDef>,
    bindings: Bindings,
) -> Result<Bound, ConstructError> {
    let mut arguments: IndexMap<String, Bound> = IndexMap::new();
    for (name, expr) in &bindings.graph {
        arguments.insert(name.clone(), resolve_expr(ctx, workflow, expr)?);
    }
    for capture in task.captures() {
        let bound = resolve_plain_capture(ctx, workflow, task, capture)?;
        arguments.insert(capture.clone(), bound);
    }
    workflow.register_task(task)?;
    let reference = create_step(ctx, workflow, task, arguments, None)?;
    Ok(Bound::Reference(reference))
}

/// Captura de un global para un task plano: solo los globales tipados se
/// vuelven parámetros; los marcados construct-time no tienen sentido aquí
/// porque el cuerpo del task corre recién en el backend.
fn resolve_plain_capture(
    ctx: &ConstructCtx,
    workflow: &mut Workflow,
    task: &Arc<TaskDef>,
    name: &str,
) -> Result<Bound, ConstructError> {
    let global = ctx.environment().get(name).ok_or_else(|| {
        ConstructError::UnresolvableVariable {
            task: task.name().to_string(),
            variable: name.to_string(),
        }
    })?;
    if global.is_at_construct() {
        return Err(ConstructError::AtConstructMisuse {
            task: task.name().to_string(),
            binding: name.to_string(),
        });
    }
    match global.typ() {
        Some(typ) => {
            let parameter =
                Parameter::new(name, typ.clone()).default_value(global.value().clone());
            Ok(Bound::Reference(workflow.register_parameter(&parameter)?))
        }
        None => Err(ConstructError::UnresolvableVariable {
            task: task.name().to_string(),
            variable: name.to_string(),
        }),
    }
}

fn resolve_subworkflow(
    ctx: &mut ConstructCtx,
    workflow: &mut Workflow,
    task: &Arc<TaskDef>,
    bindings: Bindings,
) -> Result<Bound, ConstructError> {
    let body = match task.body() {
        TaskBody::Subworkflow(body) => Arc::clone(body),
        TaskBody::Opaque => {
            return Err(ConsistencyError::Internal(format!(
                "subworkflow '{}' has no construction body",
                task.name()
            ))
            .into())
        }
    };
    if ctx.config().flatten_all_nested {
        resolve_flattened(ctx, workflow, task, body, bindings)
    } else {
        resolve_nested(ctx, workflow, task, body, bindings)
    }
}

/// Capturas de un subworkflow, como expresiones para su cuerpo. Las
/// tipadas se vuelven parámetros al primer uso (en el workflow hijo, o en
/// el padre si se está aplanando); las construct-time se pliegan.
fn capture_exprs(
    ctx: &ConstructCtx,
    task: &Arc<TaskDef>,
    body_values: &mut IndexMap<String, Expr>,
) -> Result<(), ConstructError> {
    for capture in task.captures() {
        let global = ctx.environment().get(capture).ok_or_else(|| {
            ConstructError::UnresolvableVariable {
                task: task.name().to_string(),
                variable: capture.to_string(),
            }
        })?;
        if global.is_at_construct() {
            body_values.insert(capture.clone(), Expr::Raw(Raw::new(global.value().clone())));
            continue;
        }
        match global.typ() {
            Some(typ) => {
                let parameter =
                    Parameter::new(capture, typ.clone()).default_value(global.value().clone());
                body_values.insert(capture.clone(), Expr::Param(Arc::new(parameter)));
            }
            None => {
                return Err(ConstructError::UnresolvableVariable {
                    task: task.name().to_string(),
                    variable: capture.to_string(),
                })
            }
        }
    }
    Ok(())
}

/// Modo por defecto: el subworkflow queda como `NestedStep` opaco que
/// envuelve un workflow hijo con su propio ámbito de secuencia.
fn resolve_nested(
    ctx: &mut ConstructCtx,
    workflow: &mut Workflow,
    task: &Arc<TaskDef>,
    body: SubworkflowBody,
    bindings: Bindings,
) -> Result<Bound, ConstructError> {
    // Argumentos del lado padre, resueltos contra el workflow padre.
    let mut parent_args: IndexMap<String, Bound> = IndexMap::new();
    for (name, expr) in &bindings.graph {
        parent_args.insert(name.clone(), resolve_expr(ctx, workflow, expr)?);
    }

    let mut child = Workflow::new();
    let mut body_values: IndexMap<String, Expr> = IndexMap::new();
    for decl in task.signature().args() {
        if decl.at_construct {
            continue;
        }
        let parameter = Parameter::new(&decl.name, decl.typ.clone());
        child.register_parameter(&parameter)?;
        body_values.insert(decl.name.clone(), Expr::Param(Arc::new(parameter)));
    }
    for (name, expr) in &bindings.at_construct {
        body_values.insert(name.clone(), Expr::Raw(const_eval(task, name, expr)?));
    }
    capture_exprs(ctx, task, &mut body_values)?;

    let scope = ctx.sequencer().scope();
    let body_args = BodyArgs::new(task.name(), body_values);
    ctx.enter_subworkflow_body(task.name());
    let body_result = body.as_ref()(ctx, &body_args);
    ctx.exit_body();
    let result_expr = body_result?;
    if !result_expr.has_references() {
        return Err(ConstructError::NoReferencesInResult { task: task.name().to_string() });
    }
    let child_result = resolve_expr(ctx, &mut child, &result_expr)?;
    child.set_result(child_result)?;
    drop(scope);
    debug!(
        subworkflow = task.name(),
        steps = child.steps().len(),
        "subworkflow resuelto como NestedStep"
    );

    // Los parámetros del hijo que no son argumentos declarados (capturas de
    // tasks internos) burbujean como argumentos extra del NestedStep.
    let declared: HashSet<&str> =
        task.signature().args().iter().map(|a| a.name.as_str()).collect();
    let bubbled: Vec<Parameter> = child
        .parameters()
        .values()
        .filter(|p| !declared.contains(p.name()))
        .cloned()
        .collect();
    let mut arguments = parent_args;
    for parameter in bubbled {
        let reference = workflow.register_parameter(&parameter)?;
        arguments.insert(parameter.name().to_string(), Bound::Reference(reference));
    }

    workflow.register_task(task)?;
    let reference = create_step(ctx, workflow, task, arguments, Some(child))?;
    Ok(Bound::Reference(reference))
}

/// Modo `flatten_all_nested`: el cuerpo se resuelve directamente contra el
/// workflow y el ámbito de secuencia del padre, ligando los argumentos
/// declarados a los valores del lado padre. Los steps internos caen en la
/// lista del padre preservando el orden relativo de creación; no se crea
/// ningún `NestedStep`.
fn resolve_flattened(
    ctx: &mut ConstructCtx,
    workflow: &mut Workflow,
    task: &Arc<TaskDef>,
    body: SubworkflowBody,
    bindings: Bindings,
) -> Result<Bound, ConstructError> {
    let mut body_values: IndexMap<String, Expr> = IndexMap::new();
    for (name, expr) in &bindings.graph {
        body_values.insert(name.clone(), expr.clone());
    }
    for (name, expr) in &bindings.at_construct {
        body_values.insert(name.clone(), Expr::Raw(const_eval(task, name, expr)?));
    }
    capture_exprs(ctx, task, &mut body_values)?;

    let body_args = BodyArgs::new(task.name(), body_values);
    ctx.enter_subworkflow_body(task.name());
    let body_result = body.as_ref()(ctx, &body_args);
    ctx.exit_body();
    let result_expr = body_result?;
    if !result_expr.has_references() {
        return Err(ConstructError::NoReferencesInResult { task: task.name().to_string() });
    }
    trace!(subworkflow = task.name(), "subworkflow aplanado en el padre");
    resolve_expr(ctx, workflow, &result_expr)
}

/// Evaluación constante de un binding construct-time: el árbol no puede
/// contener referencias y debe plegar a un único valor crudo.
fn const_eval(task: &TaskDef, argument: &str, expr: &Expr) -> Result<Raw, ConstructError> {
    fn eval(expr: &Expr) -> Option<Bound> {
        match expr {
            Expr::Raw(raw) => Some(Bound::Raw(raw.clone())),
            Expr::List(items) => items
                .iter()
                .map(eval)
                .collect::<Option<Vec<Bound>>>()
                .map(|items| Bound::List(items).normalized()),
            Expr::Map(entries) => entries
                .iter()
                .map(|(k, v)| eval(v).map(|b| (k.clone(), b)))
                .collect::<Option<IndexMap<String, Bound>>>()
                .map(|entries| Bound::Map(entries).normalized()),
            Expr::Binary { op, left, right } => match (eval(left), eval(right)) {
                (Some(left), Some(right)) => Some(
                    Bound::Binary { op: *op, left: Box::new(left), right: Box::new(right) }
                        .normalized(),
                ),
                _ => None,
            },
            Expr::Unary { op, operand } => eval(operand).map(|operand| {
                Bound::Unary { op: *op, operand: Box::new(operand) }.normalized()
            }),
            _ => None,
        }
    }
    match eval(expr) {
        Some(Bound::Raw(raw)) => Ok(raw),
        _ => Err(ConstructError::AtConstructReference {
            task: task.name().to_string(),
            argument: argument.to_string(),
        }),
    }
}

/// Crea (o reutiliza) el step para `(task, argumentos)`. La identidad se
/// computa antes de insertar: llamadas idénticas colapsan en un solo step
/// sin consumir número de secuencia.
fn create_step(
    ctx: &mut ConstructCtx,
    workflow: &mut Workflow,
    task: &Arc<TaskDef>,
    arguments: IndexMap<String, Bound>,
    nested: Option<Workflow>,
) -> Result<Reference, ConstructError> {
    let id = Step::compute_id(task, &arguments);
    if let Some(existing) = workflow.step_by_id(&id) {
        trace!(step = %id, "llamada idéntica colapsada en step existente");
        return Ok(Reference::step(existing.step()));
    }
    let sequence_num = ctx.sequencer().next();
    let step = Step::new(Arc::clone(task), arguments, sequence_num);
    // Leerlo aquí congela la identidad en el momento de la inserción.
    let _ = step.id();
    debug!(step = %id, seq = sequence_num, "step registrado");
    let reference = Reference::step(&step);
    let entry = match nested {
        None => WorkflowStep::Task(step),
        Some(subworkflow) => WorkflowStep::Nested(NestedStep { step, subworkflow }),
    };
    workflow.insert_step(id, entry);
    Ok(reference)
}
