use mdxtext_core::Syntax;
use mdxtext_extract::registry::{drop_component, unwrap_component};
use mdxtext_extract::{ExtractOptions, Format, UnknownComponentHandling};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;

// ============================================================================
// Extract Config
// ============================================================================

/// Built-in behaviour selectable per component from JavaScript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerRule {
    /// Keep the component's children.
    Unwrap,
    /// Remove the component and its children.
    Drop,
}

/// Configuration accepted by `extract` and `getStructure`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WasmExtractConfig {
    pub format: Option<Format>,
    pub syntax: Option<Syntax>,
    pub unknown_component_handling: Option<UnknownComponentHandling>,
    pub component_handlers: Option<BTreeMap<String, HandlerRule>>,
}

impl WasmExtractConfig {
    fn into_options(self) -> ExtractOptions {
        let mut options = ExtractOptions::default();
        if let Some(format) = self.format {
            options.format = format;
        }
        if let Some(syntax) = self.syntax {
            options.syntax = syntax;
        }
        if let Some(handling) = self.unknown_component_handling {
            options.unknown_component_handling = handling;
        }
        for (name, rule) in self.component_handlers.unwrap_or_default() {
            match rule {
                HandlerRule::Unwrap => options.component_handlers.register(name, unwrap_component),
                HandlerRule::Drop => options.component_handlers.register(name, drop_component),
            }
        }
        options
    }
}

fn parse_config(config: JsValue) -> Result<ExtractOptions, JsError> {
    if config.is_undefined() || config.is_null() {
        return Ok(ExtractOptions::default());
    }
    let config: WasmExtractConfig = serde_wasm_bindgen::from_value(config)
        .map_err(|e| JsError::new(&format!("Invalid config: {}", e)))?;
    Ok(config.into_options())
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    // plain objects instead of JS Maps for frontmatter
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

// ============================================================================
// Extraction API
// ============================================================================

/// Extracts the text content of a Markdown/MDX document.
///
/// # Arguments
///
/// * `source` - The document source
/// * `config` - Optional `{ format, syntax, unknownComponentHandling, componentHandlers }`
///
/// # Returns
///
/// `{ content, frontmatter?, diagnostics }`
#[wasm_bindgen]
pub fn extract(source: &str, config: JsValue) -> Result<JsValue, JsError> {
    let options = parse_config(config)?;
    let result = mdxtext_extract::extract(source, &options)
        .map_err(|e| JsError::new(&e.to_string()))?;
    to_js(&result)
}

/// Extracts a document and collects its heading outline.
///
/// Returns `{ content, frontmatter?, diagnostics, sections }`.
#[wasm_bindgen(js_name = getStructure)]
pub fn get_structure(source: &str, config: JsValue) -> Result<JsValue, JsError> {
    let options = parse_config(config)?;
    let structure = mdxtext_extract::get_structure(source, &options)
        .map_err(|e| JsError::new(&e.to_string()))?;
    to_js(&structure)
}

// ============================================================================
// Healing API
// ============================================================================

/// Closes unterminated Markdown constructs in a streaming buffer.
///
/// Only the last `windowSize` bytes (default 4096), extended back to a line
/// start, are examined.
#[wasm_bindgen]
pub fn heal(text: &str, window_size: Option<u32>) -> String {
    match window_size {
        Some(size) => mdxtext_core::heal(text, size as usize),
        None => mdxtext_core::heal_default(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_maps_handler_rules() {
        let config = WasmExtractConfig {
            format: Some(Format::Markdown),
            component_handlers: Some(BTreeMap::from([
                ("Note".to_string(), HandlerRule::Drop),
                ("Tabs".to_string(), HandlerRule::Unwrap),
            ])),
            ..WasmExtractConfig::default()
        };
        let options = config.into_options();
        assert_eq!(options.format, Format::Markdown);
        assert!(options.component_handlers.contains("Tabs"));

        let result = mdxtext_extract::extract("<Note>\n  gone\n</Note>\n\nkept", &options).unwrap();
        assert_eq!(result.content, "kept");
    }

    #[test]
    fn heal_uses_default_window() {
        assert_eq!(heal("**bold", None), "**bold**");
        assert_eq!(heal("`code", Some(2)), "`code`");
    }
}
