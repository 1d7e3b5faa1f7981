//! Input scrubbing applied to every field of an inbound webhook body before
//! anything else looks at it.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

struct Patterns {
    blocks: Regex,
    tags: Regex,
    js_uri: Regex,
    handlers: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        blocks: Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>")
            .expect("valid block pattern"),
        tags: Regex::new(r"(?s)</?[a-zA-Z!][^>]*>").expect("valid tag pattern"),
        js_uri: Regex::new(r"(?i)javascript\s*:").expect("valid uri pattern"),
        handlers: Regex::new(r#"(?i)\bon[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]*)"#)
            .expect("valid handler pattern"),
    })
}

pub fn sanitize_str(input: &str) -> String {
    let p = patterns();
    let out = p.blocks.replace_all(input, "");
    let out = p.tags.replace_all(&out, "");
    let out = p.handlers.replace_all(&out, "");
    let out = p.js_uri.replace_all(&out, "");
    out.trim().to_string()
}

pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_str(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(sanitize_object(map)),
        other => other,
    }
}

/// Sanitizes every top-level field, keeping the original field order.
pub fn sanitize_object(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(k, v)| (k, sanitize_value(v)))
        .collect()
}
