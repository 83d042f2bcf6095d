//! Renderer estructurado neutral.
//!
//! Produce un outline JSON por (sub)workflow: inputs, steps en orden de
//! creación y output. No es ningún formato de workflow externo; sirve para
//! ejercitar el render boundary y para inspección en tests.

use indexmap::IndexMap;
use serde_json::{json, Value};

use defer_core::constants::DEFAULT_FIELD_SEPARATOR;
use defer_core::model::{Bound, Workflow, WorkflowStep};
use defer_core::render::{base_render, RenderModule, StructuredRenderModule};

pub struct OutlineRenderer;

impl RenderModule for OutlineRenderer {
    fn default_config(&self) -> Value {
        json!({ "pretty": false })
    }
}

impl StructuredRenderModule for OutlineRenderer {
    fn render(&self, workflow: &Workflow, _config: &Value) -> IndexMap<String, Value> {
        base_render(workflow, &build_workflow)
    }
}

fn build_workflow(workflow: &Workflow) -> Value {
    let sep = DEFAULT_FIELD_SEPARATOR;

    let mut inputs = serde_json::Map::new();
    for (name, parameter) in workflow.parameters() {
        let mut input = serde_json::Map::new();
        input.insert("label".to_string(), json!(name));
        input.insert("type".to_string(), json!(parameter.typ().to_string()));
        if let Some(default) = parameter.default() {
            input.insert("default".to_string(), default.to_json());
        }
        inputs.insert(name.clone(), Value::Object(input));
    }

    let mut steps = serde_json::Map::new();
    for ws in workflow.steps_in_sequence() {
        let step = ws.step();
        let mut body = serde_json::Map::new();
        body.insert("run".to_string(), json!(step.task_name()));
        body.insert("seq".to_string(), json!(step.sequence_num()));
        let mut args = serde_json::Map::new();
        for (name, bound) in step.arguments() {
            args.insert(name.clone(), render_argument(workflow, bound, sep));
        }
        body.insert("in".to_string(), Value::Object(args));
        body.insert("out".to_string(), json!(["out"]));
        if let WorkflowStep::Nested(_) = ws {
            body.insert("nested".to_string(), json!(true));
        }
        steps.insert(workflow.remap(step.id()).to_string(), Value::Object(body));
    }

    let outputs = match workflow.result() {
        Some(result) => json!({
            "out": {
                "label": "out",
                "type": workflow.result_type().map(|t| t.to_string()),
                "source": result.display(workflow, sep),
            }
        }),
        None => json!({}),
    };

    json!({
        "inputs": Value::Object(inputs),
        "outputs": outputs,
        "steps": Value::Object(steps),
    })
}

fn render_argument(workflow: &Workflow, bound: &Bound, sep: &str) -> Value {
    match bound {
        Bound::Raw(raw) => json!({ "default": raw.value().to_json() }),
        Bound::Reference(reference) => {
            json!({ "source": reference.display_name(workflow, sep) })
        }
        expression => {
            let sources: Vec<String> = expression
                .references()
                .into_iter()
                .map(|r| r.display_name(workflow, sep))
                .collect();
            json!({
                "expression": expression.display(workflow, sep),
                "sources": sources,
            })
        }
    }
}
