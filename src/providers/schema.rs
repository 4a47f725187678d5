// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! JSON-Schema-subset translation shared by every provider.
//!
//! Recursive walk that copies `type`, `description`, `required`, `enum`,
//! and recursively translates `properties`/`items`; unknown constructs are
//! ignored, and missing/non-object input yields an empty object schema.

use serde_json::{json, Map, Value};

/// `type` values this crate's tool-parameter schemas support, mapped 1:1
/// onto the vendor vocabulary (every provider used here accepts the same
/// JSON-Schema primitive names, so this is the identity map, kept as a
/// function so a future vendor with a different vocabulary has a single
/// place to diverge).
fn translate_type(t: &str) -> Option<&'static str> {
    match t {
        "string" => Some("string"),
        "number" => Some("number"),
        "integer" => Some("integer"),
        "boolean" => Some("boolean"),
        "array" => Some("array"),
        "object" => Some("object"),
        _ => None,
    }
}

/// Translate one JSON-Schema-subset node into the vendor schema vocabulary.
pub fn translate_schema(schema: &Value) -> Value {
    let Some(obj) = schema.as_object() else {
        return json!({});
    };

    let mut out = Map::new();

    if let Some(t) = obj.get("type").and_then(|v| v.as_str()) {
        if let Some(mapped) = translate_type(t) {
            out.insert("type".to_string(), json!(mapped));
        }
    }

    if let Some(desc) = obj.get("description").and_then(|v| v.as_str()) {
        out.insert("description".to_string(), json!(desc));
    }

    if let Some(required) = obj.get("required").and_then(|v| v.as_array()) {
        out.insert("required".to_string(), json!(required.clone()));
    }

    if let Some(enum_values) = obj.get("enum").and_then(|v| v.as_array()) {
        out.insert("enum".to_string(), json!(enum_values.clone()));
    }

    if let Some(properties) = obj.get("properties").and_then(|v| v.as_object()) {
        let mut translated_props = Map::new();
        for (key, value) in properties {
            translated_props.insert(key.clone(), translate_schema(value));
        }
        out.insert("properties".to_string(), Value::Object(translated_props));
    }

    if let Some(items) = obj.get("items") {
        out.insert("items".to_string(), translate_schema(items));
    }

    Value::Object(out)
}
