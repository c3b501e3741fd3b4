use crate::assembler::CompileOptions;
use crate::emit::EmitOptions;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn compile_project_json(source: &str) -> Result<String, JsValue> {
    compile_project_json_with_options(source, "LIT Project", false)
}

#[wasm_bindgen]
pub fn compile_project_json_with_options(
    source: &str,
    window_title: &str,
    keep_going: bool,
) -> Result<String, JsValue> {
    let emit_options = EmitOptions {
        window_title: window_title.to_string(),
        ..EmitOptions::default()
    };
    let options = CompileOptions {
        isolate_failures: keep_going,
    };
    crate::compile_source_to_go(source, options, &emit_options)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
