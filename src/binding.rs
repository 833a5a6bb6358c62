use crate::parser::parse_component;
use crate::validate::ParserOptions;
use napi_derive::napi;

/// `parse_component` for JavaScript callers: takes the options object and
/// returns the collected documentation as JSON.
#[napi]
pub fn parse_component_native(options: serde_json::Value) -> napi::Result<serde_json::Value> {
    let options =
        ParserOptions::from_json(&options).map_err(|e| napi::Error::from_reason(e.to_string()))?;
    let doc = parse_component(options).map_err(|e| napi::Error::from_reason(e.to_string()))?;
    serde_json::to_value(doc).map_err(|e| napi::Error::from_reason(e.to_string()))
}
