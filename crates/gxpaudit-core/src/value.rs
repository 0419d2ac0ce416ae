//! Lenient readers for loosely-typed JSON produced by a language model.
//!
//! Generated payloads are shaped by a prompt, not a schema, so a field that
//! should be a string occasionally arrives as a number and a list occasionally
//! arrives as a single string. These helpers apply one conversion policy for
//! every record type instead of scattering ad hoc defaults across call sites.

use serde_json::{Map, Value};

/// Read a scalar as text.
///
/// Strings are returned as-is, numbers and booleans are rendered, and
/// `null`, arrays, and objects yield `None`.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Read an optional text field from an object.
pub fn opt_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(scalar_string)
}

/// Read an ordered list of strings from an object.
///
/// Absent or `null` yields an empty list. A bare scalar is promoted to a
/// one-element list. Inside an array, `null` entries are skipped and nested
/// structures are kept as their compact JSON text so no item is lost.
pub fn string_list(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    match obj.get(key) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| scalar_string(v).unwrap_or_else(|| v.to_string()))
            .collect(),
        Some(other) => scalar_string(other)
            .map(|s| vec![s])
            .unwrap_or_else(|| vec![other.to_string()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn scalar_string_renders_numbers_and_bools() {
        assert_eq!(scalar_string(&json!("x")), Some("x".into()));
        assert_eq!(scalar_string(&json!(0.95)), Some("0.95".into()));
        assert_eq!(scalar_string(&json!(true)), Some("true".into()));
        assert_eq!(scalar_string(&json!(null)), None);
        assert_eq!(scalar_string(&json!([1])), None);
    }

    #[test]
    fn string_list_absent_is_empty() {
        let o = obj(json!({"other": 1}));
        assert!(string_list(&o, "items").is_empty());
        let o = obj(json!({"items": null}));
        assert!(string_list(&o, "items").is_empty());
    }

    #[test]
    fn string_list_preserves_order_and_skips_nulls() {
        let o = obj(json!({"items": ["b", null, "a", 3]}));
        assert_eq!(string_list(&o, "items"), vec!["b", "a", "3"]);
    }

    #[test]
    fn string_list_promotes_bare_scalar() {
        let o = obj(json!({"items": "only one"}));
        assert_eq!(string_list(&o, "items"), vec!["only one"]);
    }

    #[test]
    fn string_list_keeps_nested_values_as_json() {
        let o = obj(json!({"items": [{"doc": "SOP-1"}]}));
        assert_eq!(string_list(&o, "items"), vec![r#"{"doc":"SOP-1"}"#]);
    }
}
