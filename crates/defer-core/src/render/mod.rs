//! Render boundary: contrato entre un workflow terminado y los renderers.
//!
//! El core no define ningún formato de salida; define la interfaz que un
//! renderer implementa y los helpers para recorrer el grafo. Dos variantes
//! de capacidad, seleccionadas explícitamente al cargar el módulo:
//! - `RawRenderModule`: produce texto plano por (sub)workflow.
//! - `StructuredRenderModule`: produce estructuras serializables.
//!
//! Ambas devuelven al menos la entrada `__root__` para el workflow raíz.
//! Los renderers tratan el `Workflow` como solo lectura.

use indexmap::IndexMap;
use serde_json::Value;

use crate::constants::ROOT_KEY;
use crate::model::step::WorkflowStep;
use crate::model::workflow::Workflow;

/// Rutinas comunes a todo módulo de render.
pub trait RenderModule {
    /// Configuración por defecto del renderer: un dict estático y
    /// serializable, sobreescribible por llamada.
    fn default_config(&self) -> Value {
        Value::Object(Default::default())
    }
}

/// Renderer que produce texto plano.
pub trait RawRenderModule: RenderModule {
    /// Una entrada por (sub)workflow, con `__root__` para el raíz.
    fn render_raw(&self, workflow: &Workflow, config: &Value) -> IndexMap<String, String>;
}

/// Renderer que produce estructuras JSON-serializables.
pub trait StructuredRenderModule: RenderModule {
    /// Una entrada por (sub)workflow, con `__root__` para el raíz.
    fn render(&self, workflow: &Workflow, config: &Value) -> IndexMap<String, Value>;
}

/// Capacidad concreta de un renderer, elegida al cargarlo. Unión cerrada:
/// el llamador puede hacer match exhaustivo.
pub enum RenderMethod<'a> {
    Raw(&'a dyn RawRenderModule),
    Structured(&'a dyn StructuredRenderModule),
}

impl<'a> RenderMethod<'a> {
    pub fn raw(module: &'a dyn RawRenderModule) -> Self {
        RenderMethod::Raw(module)
    }

    pub fn structured(module: &'a dyn StructuredRenderModule) -> Self {
        RenderMethod::Structured(module)
    }

    /// Interfaz uniforme: siempre strings, serializando el caso
    /// estructurado (con formato si `pretty`).
    pub fn render_to_strings(
        &self,
        workflow: &Workflow,
        config: &Value,
        pretty: bool,
    ) -> IndexMap<String, String> {
        match self {
            RenderMethod::Raw(module) => module.render_raw(workflow, config),
            RenderMethod::Structured(module) => module
                .render(workflow, config)
                .into_iter()
                .map(|(key, value)| {
                    let text = if pretty {
                        serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
                    } else {
                        value.to_string()
                    };
                    (key, text)
                })
                .collect(),
        }
    }
}

/// Recorre el workflow y sus anidados aplicando `build` a cada uno.
///
/// Devuelve el mapa de subworkflows (clave = nombre mostrado del
/// `NestedStep`) más la entrada `__root__` del workflow principal.
pub fn base_render<T>(
    workflow: &Workflow,
    build: &dyn Fn(&Workflow) -> T,
) -> IndexMap<String, T> {
    let primary = build(workflow);
    let mut out = IndexMap::new();
    for ws in workflow.steps() {
        if let WorkflowStep::Nested(nested) = ws {
            let inner = base_render(nested.subworkflow(), build);
            for (key, value) in inner {
                if key == ROOT_KEY {
                    out.insert(workflow.remap(nested.step().id()).to_string(), value);
                } else {
                    out.insert(key, value);
                }
            }
        }
    }
    out.insert(ROOT_KEY.to_string(), primary);
    out
}
