//! Render boundary de punta a punta con el OutlineRenderer.

use defer_adapters::tasks::{add_constant, increment};
use defer_adapters::OutlineRenderer;
use defer_core::render::{RenderMethod, StructuredRenderModule};
use defer_core::{call_args, param, ConstructEngine, Environment, ValueType, Workflow};
use serde_json::json;

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

fn build_workflow() -> Workflow {
    ConstructEngine::builder()
        .environment(Environment::new().typed("CONSTANT", ValueType::Int, 3))
        .simplify_ids(true)
        .build()
        .construct(increment().call(call_args! {
            num: add_constant().call(call_args! {
                num: increment().call(call_args! { num: param("num", ValueType::Int) }),
            }),
        }))
        .expect("construction should succeed")
}

#[test]
fn outline_renders_root_and_nested_workflows() {
    init_tracing();
    let workflow = build_workflow();
    let rendered = OutlineRenderer.render(&workflow, &json!({}));

    // una entrada por subworkflow más la raíz
    assert_eq!(rendered.len(), 2);
    let root = rendered.get("__root__").expect("__root__ entry");
    let nested = rendered.get("add_constant-1").expect("nested entry");

    // la raíz lista los parámetros descubiertos, incluido el burbujeado
    let inputs = root["inputs"].as_object().unwrap();
    assert!(inputs.contains_key("num"));
    assert!(inputs.contains_key("CONSTANT"));
    assert_eq!(inputs["CONSTANT"]["default"], json!(3));

    // el NestedStep pasa el parámetro capturado hacia adentro
    let steps = root["steps"].as_object().unwrap();
    let nested_in = steps["add_constant-1"]["in"].as_object().unwrap();
    assert_eq!(nested_in["CONSTANT"], json!({ "source": "CONSTANT" }));
    assert_eq!(steps["add_constant-1"]["nested"], json!(true));

    // el hijo enlaza sus steps internos con ids simplificados
    let child_steps = nested["steps"].as_object().unwrap();
    assert!(child_steps.contains_key("sum-1-1"));
    assert!(child_steps.contains_key("to_int-1-1"));
    let to_int_in = child_steps["to_int-1-1"]["in"].as_object().unwrap();
    assert_eq!(to_int_in["num"], json!({ "source": "sum-1-1/out" }));

    // la salida del hijo apunta a su último step
    assert_eq!(nested["outputs"]["out"]["source"], json!("to_int-1-1/out"));
}

#[test]
fn render_method_serializes_structured_output() {
    init_tracing();
    let workflow = build_workflow();
    let renderer = OutlineRenderer;
    let method = RenderMethod::structured(&renderer);
    let rendered = method.render_to_strings(&workflow, &json!({}), true);

    let root_text = rendered.get("__root__").unwrap();
    let parsed: serde_json::Value = serde_json::from_str(root_text).unwrap();
    assert!(parsed["steps"].as_object().unwrap().len() >= 3);
}
