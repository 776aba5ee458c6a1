// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Deep JSON normalization for debug output.
//
// Persistence libraries commonly store JSON whose values are themselves
// JSON-encoded strings, several levels deep. `normalize` unwraps those layers
// so debug traces show a real tree instead of escaped strings. Only log
// output goes through here; persisted content is never touched.

use serde_json::Value;

/// Parse `raw` as JSON and recursively unwrap nested JSON-encoded strings.
///
/// Input that is not JSON comes back as a plain string value.
///
/// ```rust
/// use keyfile_storage::normalize::normalize;
/// use serde_json::json;
///
/// let nested = r#"{"a":"{\"b\":1}"}"#;
/// assert_eq!(normalize(nested), json!({"a": {"b": 1}}));
/// assert_eq!(normalize("not json"), json!("not json"));
/// ```
pub fn normalize(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(parsed) => normalize_parsed(parsed),
        Err(_) => Value::String(raw.to_string()),
    }
}

fn normalize_parsed(value: Value) -> Value {
    match value {
        // A numeric string survives JSON-in-JSON; parsing it again would
        // change its type.
        Value::String(s) if is_numeric(&s) => Value::String(s),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_nested).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, normalize_nested(value)))
                .collect(),
        ),
        other => other,
    }
}

/// Children are re-stringified (unless already strings) and normalized again.
fn normalize_nested(value: Value) -> Value {
    match value {
        Value::String(s) => normalize(&s),
        other => normalize(&other.to_string()),
    }
}

/// JSON number syntax only; `inf`, `NaN` and `+5` are not numeric here.
fn is_numeric(s: &str) -> bool {
    serde_json::from_str::<serde_json::Number>(s.trim()).is_ok()
}
