//! Runtime environment detection and default configuration lookup.

use std::env;
use std::fs;

use serde_json::Value;

const DEFAULTS_VAR: &str = "__WEB_VITALS_DEFAULTS__";
const DEFAULTS_PATH_VAR: &str = "__WEB_VITALS_DEFAULTS_PATH";
const FORCE_ENVIRONMENT_VAR: &str = "WEB_VITALS_FORCE_ENVIRONMENT";

/// Returns the `__WEB_VITALS_DEFAULTS__` object when one is provided.
///
/// Sources are checked in order: the environment variable, the file named by
/// `__WEB_VITALS_DEFAULTS_PATH`, then (in the browser) a global of the same name.
pub fn instrumentation_defaults() -> Option<Value> {
    defaults_from_env()
        .or_else(defaults_from_path)
        .or_else(defaults_from_global)
}

fn defaults_from_env() -> Option<Value> {
    let raw = env::var(DEFAULTS_VAR).ok()?;
    parse_json_object(&raw)
}

fn defaults_from_path() -> Option<Value> {
    let path = env::var(DEFAULTS_PATH_VAR).ok()?;
    let content = fs::read_to_string(path).ok()?;
    parse_json_object(&content)
}

#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
fn defaults_from_global() -> Option<Value> {
    use wasm_bindgen::JsValue;

    let global = js_sys::global();
    let value = js_sys::Reflect::get(&global, &JsValue::from_str(DEFAULTS_VAR)).ok()?;
    if value.is_null() || value.is_undefined() {
        return None;
    }
    let serialized = js_sys::JSON::stringify(&value).ok()?.as_string()?;
    parse_json_object(&serialized)
}

#[cfg(not(all(target_arch = "wasm32", feature = "wasm-web")))]
fn defaults_from_global() -> Option<Value> {
    None
}

fn parse_json_object(raw: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => {
            log::debug!("ignoring instrumentation defaults: expected a JSON object");
            None
        }
        Err(err) => {
            log::debug!("ignoring malformed instrumentation defaults: {err}");
            None
        }
    }
}

fn force_environment() -> Option<String> {
    env::var(FORCE_ENVIRONMENT_VAR)
        .ok()
        .map(|value| value.trim().to_lowercase())
}

/// Returns `true` if the runtime should behave as a browser environment.
pub fn is_browser() -> bool {
    if let Some(forced) = force_environment() {
        return forced == "browser";
    }

    #[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
    {
        use wasm_bindgen::JsCast;
        js_sys::global().dyn_into::<web_sys::Window>().is_ok()
    }

    #[cfg(not(all(target_arch = "wasm32", feature = "wasm-web")))]
    {
        false
    }
}
